//! Discovery scanner - enumerates extension candidates
//!
//! Candidates come from two sources: an explicit registry of built-in
//! constructors (compiled into the host) and a single, non-recursive scan
//! of the extension root for loadable package files. Per-candidate failures
//! are recorded and skipped; they never abort the scan.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use super::error::ExtensionHostError;
use super::loader::{self, IsolationUnit};
use tiller_extension_api::Extension;

/// Constructor for a built-in (statically linked) extension.
pub type ExtensionFactory = Box<dyn Fn() -> Box<dyn Extension> + Send + Sync>;

/// Explicit registry of built-in extension constructors.
///
/// Built-ins register here at host construction time; there is no
/// reflection-style scan of the host's own code.
#[derive(Default)]
pub struct BuiltinRegistry {
    factories: Vec<ExtensionFactory>,
}

impl BuiltinRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Register a built-in extension constructor
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    /// Number of registered constructors
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no constructors are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// One instantiated extension candidate.
pub struct Candidate {
    /// The realized instance
    pub instance: Box<dyn Extension>,
    /// Filesystem path the candidate was loaded from; `None` for built-ins
    pub origin: Option<PathBuf>,
    /// Owning isolation unit; `None` for built-ins
    pub unit: Option<IsolationUnit>,
}

/// A candidate that could not be instantiated. Non-fatal to the scan.
#[derive(Debug, Clone)]
pub struct DiscoveryFault {
    /// Where the candidate came from (package path or "builtin")
    pub origin: String,
    /// Why instantiation failed
    pub message: String,
}

/// Result of one discovery pass.
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    pub faults: Vec<DiscoveryFault>,
}

/// Enumerate all candidates: built-ins first, then drop-in packages from a
/// single non-recursive scan of `dir`. Package paths are visited in sorted
/// order so discovery is deterministic.
pub fn scan(builtins: &BuiltinRegistry, dir: &Path) -> Result<ScanOutcome, ExtensionHostError> {
    let mut candidates = Vec::new();
    let mut faults = Vec::new();

    for factory in &builtins.factories {
        // A constructor that panics is skipped, not fatal to discovery
        match std::panic::catch_unwind(AssertUnwindSafe(factory)) {
            Ok(instance) => candidates.push(Candidate {
                instance,
                origin: None,
                unit: None,
            }),
            Err(_) => faults.push(DiscoveryFault {
                origin: "builtin".to_string(),
                message: "constructor panicked".to_string(),
            }),
        }
    }

    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "Extension directory does not exist");
        return Ok(ScanOutcome { candidates, faults });
    }

    let mut packages: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_loadable_package(&path) {
            packages.push(path);
        }
    }
    packages.sort();

    for path in packages {
        match loader::load(&path) {
            Ok((unit, instance)) => candidates.push(Candidate {
                instance,
                origin: Some(path),
                unit: Some(unit),
            }),
            Err(e) => faults.push(DiscoveryFault {
                origin: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    Ok(ScanOutcome { candidates, faults })
}

/// Whether `path` looks like a loadable package on this platform
fn is_loadable_package(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };

    if cfg!(target_os = "macos") {
        matches!(ext, "dylib" | "so")
    } else if cfg!(target_os = "windows") {
        ext == "dll"
    } else {
        ext == "so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tiller_extension_api::ExtensionDescriptor;

    #[derive(Default)]
    struct Stub;

    #[async_trait::async_trait]
    impl Extension for Stub {
        fn descriptor(&self) -> ExtensionDescriptor {
            ExtensionDescriptor {
                id: "stub".to_string(),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_scan_missing_dir_yields_builtins_only() {
        let mut builtins = BuiltinRegistry::new();
        builtins.register(|| Box::new(Stub));

        let outcome = scan(&builtins, Path::new("/nonexistent/extensions")).unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.faults.is_empty());
        assert!(outcome.candidates[0].origin.is_none());
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = TempDir::new().unwrap();
        let outcome = scan(&BuiltinRegistry::new(), dir.path()).unwrap();
        assert!(outcome.candidates.is_empty());
        assert!(outcome.faults.is_empty());
    }

    #[test]
    fn test_panicking_constructor_is_recorded_and_skipped() {
        let mut builtins = BuiltinRegistry::new();
        builtins.register(|| panic!("broken constructor"));
        builtins.register(|| Box::new(Stub) as Box<dyn Extension>);

        let outcome = scan(&builtins, Path::new("/nonexistent")).unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.faults.len(), 1);
        assert_eq!(outcome.faults[0].origin, "builtin");
    }

    #[test]
    fn test_garbage_package_is_recorded_and_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("libbroken.so"), b"not a library").unwrap();

        let outcome = scan(&BuiltinRegistry::new(), dir.path()).unwrap();
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.faults.len(), 1);
        assert!(outcome.faults[0].origin.contains("libbroken.so"));
    }

    #[test]
    fn test_non_package_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("state.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let outcome = scan(&BuiltinRegistry::new(), dir.path()).unwrap();
        assert!(outcome.candidates.is_empty());
        assert!(outcome.faults.is_empty());
    }

    #[test]
    fn test_scan_is_non_recursive() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("libnested.so"), b"not a library").unwrap();

        let outcome = scan(&BuiltinRegistry::new(), dir.path()).unwrap();
        assert!(outcome.candidates.is_empty());
        assert!(outcome.faults.is_empty());
    }
}
