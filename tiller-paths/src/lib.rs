//! Filesystem paths for tiller.
//!
//! CLI tools and the server use XDG paths for cross-platform consistency,
//! not platform-native paths. This matches tools like gh, docker, kubectl.

use std::path::PathBuf;

/// Environment variable that overrides the extension root directory.
pub const EXTENSIONS_DIR_ENV: &str = "TILLER_EXTENSIONS_DIR";

/// Get the tiller data directory.
///
/// Returns `$XDG_DATA_HOME/tiller` if set, otherwise `~/.local/share/tiller`.
/// This is where persistent runtime data is stored.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("tiller")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share/tiller")
    } else {
        PathBuf::from(".local/share/tiller")
    }
}

/// Get the root directory for drop-in extensions.
///
/// Resolution order:
/// 1. `TILLER_EXTENSIONS_DIR` if set
/// 2. `data_dir()/extensions`
/// 3. an `extensions` directory next to the running binary, when no home
///    directory is available
///
/// The directory holds the loadable package files, per-extension data
/// directories, and the persisted enabled-state document.
pub fn extensions_dir() -> PathBuf {
    if let Ok(root) = std::env::var(EXTENSIONS_DIR_ENV) {
        return PathBuf::from(root);
    }

    if std::env::var("XDG_DATA_HOME").is_ok() || dirs::home_dir().is_some() {
        return data_dir().join("extensions");
    }

    // Last resort: install-root fallback
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("extensions")))
        .unwrap_or_else(|| PathBuf::from("extensions"))
}
