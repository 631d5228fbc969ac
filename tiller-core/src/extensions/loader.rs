//! Isolation loader - wraps each drop-in package in a reclaimable unit
//!
//! Each package is loaded into its own [`IsolationUnit`] so its code and
//! static state can be released after `on_unload`, letting the backing file
//! be replaced on disk without a stale mapping. True hot-unload of native
//! code depends on the platform loader honoring the final `dlclose`; the
//! unit tracks released state either way.

use libloading::Library;
use std::path::{Path, PathBuf};

use super::error::ExtensionHostError;
use tiller_extension_api::{API_VERSION, Extension};

/// A reclaimable loading boundary for one drop-in package.
///
/// Owned by the extension's registry record and released exactly once.
/// The host must drop the extension instance before the unit releases the
/// library: the instance's code lives inside it.
pub struct IsolationUnit {
    path: PathBuf,
    library: Option<Library>,
}

impl IsolationUnit {
    /// Filesystem path of the package this unit was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing library has been released
    pub fn is_released(&self) -> bool {
        self.library.is_none()
    }

    /// Release the backing library. Safe to call more than once; only the
    /// first call drops the library.
    pub fn release(&mut self) {
        if let Some(library) = self.library.take() {
            drop(library);
            tracing::debug!(path = %self.path.display(), "Isolation unit released");
        }
    }
}

impl Drop for IsolationUnit {
    fn drop(&mut self) {
        self.release();
    }
}

/// Load the package at `path` into a fresh isolation unit and instantiate
/// the extension it exposes.
///
/// Fails with [`ExtensionHostError::NoExtension`] if the package exports no
/// extension entry points (the unit is dropped, since nothing was kept) and
/// with [`ExtensionHostError::ApiVersionMismatch`] if it was built against
/// a different API revision. A package can expose at most one extension:
/// the entry-point symbols are fixed, so a second `export_extension!` in
/// one library cannot link.
pub fn load(path: &Path) -> Result<(IsolationUnit, Box<dyn Extension>), ExtensionHostError> {
    // SAFETY: We're loading a package the operator dropped into the
    // extension directory. It is expected to follow the Extension contract.
    let library = unsafe { Library::new(path)? };

    let instance = {
        // SAFETY: We're calling C functions exported by the package via
        // export_extension!.
        let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
            unsafe { library.get(b"_tiller_extension_api_version") }.map_err(|_| {
                ExtensionHostError::NoExtension {
                    path: path.to_path_buf(),
                }
            })?;

        let package_api_version = api_version_fn();
        if package_api_version != API_VERSION {
            return Err(ExtensionHostError::ApiVersionMismatch {
                expected: API_VERSION,
                found: package_api_version,
            });
        }

        // SAFETY: The create function returns a raw pointer that we convert
        // back to a Box<dyn Extension>; ownership transfers to the host.
        let create_fn: libloading::Symbol<extern "C" fn() -> *mut dyn Extension> =
            unsafe { library.get(b"_tiller_extension_create") }.map_err(|_| {
                ExtensionHostError::NoExtension {
                    path: path.to_path_buf(),
                }
            })?;

        unsafe { Box::from_raw(create_fn()) }
    };

    Ok((
        IsolationUnit {
            path: path.to_path_buf(),
            library: Some(library),
        },
        instance,
    ))
}
