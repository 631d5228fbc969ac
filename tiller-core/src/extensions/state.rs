//! Persisted enabled-state store
//!
//! A flat mapping from extension id to its last-known enabled flag, stored
//! as a small JSON document next to the extension packages. The document is
//! a cache of operator intent, not a source of truth for what is loaded:
//! it is read in full at startup and rewritten in full on every change, and
//! stale entries for removed extensions are ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::ExtensionHostError;

/// Durable record of each extension's last-known enabled flag.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateStore {
    #[serde(skip)]
    path: PathBuf,
    /// Extension id to enabled flag
    #[serde(default)]
    enabled: HashMap<String, bool>,
}

impl StateStore {
    /// Load the state document from `path`.
    ///
    /// Returns an empty store if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ExtensionHostError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                enabled: HashMap::new(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut store: Self = serde_json::from_str(&content)
            .map_err(|e| ExtensionHostError::State(e.to_string()))?;
        store.path = path.to_path_buf();
        Ok(store)
    }

    /// Last-known enabled flag for `id`, if one was ever recorded.
    pub fn get(&self, id: &str) -> Option<bool> {
        self.enabled.get(id).copied()
    }

    /// Record `enabled` for `id` and rewrite the document.
    ///
    /// Re-reads the file first so concurrent writers (the caller serializes
    /// them behind a lock) and external edits are merged rather than lost.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), ExtensionHostError> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let current: Self = serde_json::from_str(&content)
                .map_err(|e| ExtensionHostError::State(e.to_string()))?;
            self.enabled = current.enabled;
        }
        self.enabled.insert(id.to_string(), enabled);
        self.save()
    }

    fn save(&self) -> Result<(), ExtensionHostError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ExtensionHostError::State(e.to_string()))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
