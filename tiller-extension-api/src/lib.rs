//! tiller-extension-api - Extension API for the tiller server
//!
//! This crate provides the traits and types needed to write extensions for
//! tiller. Extensions are native Rust dynamic libraries (or statically
//! registered built-ins) that plug optional functionality into the server:
//! CRM enrichment, SMS campaign hooks, audit trails, and the like.
//!
//! # Example
//!
//! ```ignore
//! use tiller_extension_api::{
//!     Extension, ExtensionContext, ExtensionDescriptor, ExtensionError, export_extension,
//! };
//!
//! #[derive(Default)]
//! pub struct MyExtension;
//!
//! #[async_trait::async_trait]
//! impl Extension for MyExtension {
//!     fn descriptor(&self) -> ExtensionDescriptor {
//!         ExtensionDescriptor {
//!             id: "my-extension".to_string(),
//!             name: "My Extension".to_string(),
//!             description: "Does something useful".to_string(),
//!             ..Default::default()
//!         }
//!     }
//!
//!     async fn on_enable(&mut self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
//!         ctx.log_info("Extension enabled!");
//!         Ok(())
//!     }
//! }
//!
//! export_extension!(MyExtension);
//! ```

pub mod context;
pub mod error;
pub mod types;

pub use async_trait::async_trait;
pub use context::{ExtensionConfig, ExtensionContext};
pub use error::ExtensionError;
pub use types::{ExtensionDescriptor, ServiceSpec};

/// Current extension API version. Drop-in extensions must match this exactly;
/// the host checks it before instantiating anything from a package.
pub const API_VERSION: u32 = 1;

/// The core extension trait.
///
/// Lifecycle callbacks are async because they may perform IO (registering a
/// route, opening a data file, reading configuration). Each callback returns
/// a typed result; the host inspects faults as values and never relies on
/// panics for control flow.
///
/// Call order per instance: `on_load` once, then any number of
/// `on_enable`/`on_disable` cycles, then `on_unload` at most once.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Return the extension's descriptor. Pure; stable for the instance's
    /// lifetime; callable any number of times.
    fn descriptor(&self) -> ExtensionDescriptor;

    /// Called once, before any other lifecycle callback. Use this to
    /// register services. Must not assume any other extension has been
    /// loaded or enabled yet.
    async fn on_load(&mut self, _ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Activate externally visible behavior. Never called while already
    /// enabled; may be called again after `on_disable`.
    async fn on_enable(&mut self, _ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Reverse `on_enable`. Must be safe to call even if `on_enable`
    /// partially failed.
    async fn on_disable(&mut self, _ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Final teardown before the instance and its loading unit are
    /// released. Called at most once, after `on_disable` if the extension
    /// was enabled.
    async fn on_unload(&mut self, _ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        Ok(())
    }
}

/// Export an extension type for dynamic loading.
///
/// This macro generates the C ABI entry points that the tiller host uses to
/// load and unload extensions. The symbols are unmangled and fixed, so a
/// package can hold exactly one extension; a second `export_extension!` in
/// the same library is a duplicate-symbol link error.
///
/// # Usage
///
/// ```ignore
/// tiller_extension_api::export_extension!(MyExtension);
/// ```
///
/// # Generated Functions
///
/// - `_tiller_extension_create()`: Creates a new extension instance
/// - `_tiller_extension_api_version()`: Returns the API version
/// - `_tiller_extension_destroy()`: Destroys an extension instance
#[macro_export]
macro_rules! export_extension {
    ($extension_type:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _tiller_extension_create() -> *mut dyn $crate::Extension {
            let extension: Box<dyn $crate::Extension> = Box::new(<$extension_type>::default());
            Box::into_raw(extension)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _tiller_extension_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _tiller_extension_destroy(ptr: *mut dyn $crate::Extension) {
            if !ptr.is_null() {
                unsafe {
                    drop(Box::from_raw(ptr));
                }
            }
        }
    };
}
