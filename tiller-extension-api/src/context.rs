//! ExtensionContext - an extension's interface to host capabilities

use crate::error::ExtensionError;
use crate::types::ServiceSpec;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An extension's interface to host capabilities.
///
/// The context is passed to every lifecycle callback and provides:
/// - Service registration (during `on_load`)
/// - Read-only configuration loaded from the extension's `config.toml`
/// - A per-extension data directory
/// - Logging helpers tagged with the extension id
///
/// Nothing host-specific is injected here so that extensions stay portable
/// across host versions.
pub struct ExtensionContext {
    extension_id: String,
    data_dir: PathBuf,
    config: ExtensionConfig,
    /// Services pending registration; the host validates and commits these
    /// after `on_load` returns
    pending_services: Vec<ServiceSpec>,
}

/// Read-only extension configuration backed by TOML.
///
/// Operators edit the file on disk; extensions only read values.
pub struct ExtensionConfig {
    values: HashMap<String, toml::Value>,
}

impl ExtensionContext {
    /// Create a new context with an empty configuration
    pub fn new(extension_id: String, data_dir: PathBuf) -> Self {
        Self {
            extension_id,
            data_dir,
            config: ExtensionConfig::empty(),
            pending_services: Vec::new(),
        }
    }

    /// Create a context with a pre-loaded configuration
    pub fn with_config(extension_id: String, data_dir: PathBuf, config: ExtensionConfig) -> Self {
        Self {
            extension_id,
            data_dir,
            config,
            pending_services: Vec::new(),
        }
    }

    /// Get the extension's id
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Get the extension's data directory (for storing its own files)
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read a configuration value
    ///
    /// # Example
    /// ```ignore
    /// let batch_size: Option<u32> = ctx.config_get("batch_size");
    /// ```
    pub fn config_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.get(key)
    }

    // ─── Service Registration ────────────────────────────────────────

    /// Register a service this extension offers to the host.
    ///
    /// Must be called during `on_load`; the host commits registrations only
    /// after `on_load` succeeds and removes them when the extension is
    /// unloaded.
    ///
    /// Returns an error if the service name is already pending for this
    /// extension.
    pub fn register_service(&mut self, spec: ServiceSpec) -> Result<(), ExtensionError> {
        if self.pending_services.iter().any(|s| s.name == spec.name) {
            return Err(ExtensionError::DuplicateService(spec.name));
        }
        self.pending_services.push(spec);
        Ok(())
    }

    /// Get services pending registration (used by the host)
    pub fn pending_services(&self) -> &[ServiceSpec] {
        &self.pending_services
    }

    /// Take pending services (used by the host after validation)
    pub fn take_pending_services(&mut self) -> Vec<ServiceSpec> {
        std::mem::take(&mut self.pending_services)
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically tagged with the extension id)
    pub fn log_info(&self, message: &str) {
        tracing::info!(extension = %self.extension_id, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(extension = %self.extension_id, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(extension = %self.extension_id, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(extension = %self.extension_id, "{}", message);
    }
}

impl ExtensionConfig {
    /// Create an empty configuration
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// Returns an empty configuration if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ExtensionError> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let content = std::fs::read_to_string(path)?;
        let values: HashMap<String, toml::Value> =
            toml::from_str(&content).map_err(|e| ExtensionError::Config(e.to_string()))?;
        Ok(Self { values })
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Whether the configuration holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self::empty()
    }
}
