//! Extension descriptor and service metadata

use serde::{Deserialize, Serialize};

/// Static identity and metadata for an extension.
///
/// The descriptor is declared by the extension author and must be stable
/// for the lifetime of an instance. The `id` is the primary key for every
/// host-side lookup and must be unique within a single discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Unique, stable identifier (used for CLI commands and all lookups)
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Extension version (semver)
    pub version: String,
    /// Extension author
    pub author: String,
    /// Ids of extensions whose lifecycle callbacks must run first.
    /// Ids that are never discovered are ignored for ordering.
    pub dependencies: Vec<String>,
    /// Whether the extension should be enabled when no operator has
    /// recorded an explicit enable/disable for it yet
    pub enabled_by_default: bool,
}

impl Default for ExtensionDescriptor {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            version: "0.0.1".to_string(),
            author: String::new(),
            dependencies: Vec::new(),
            enabled_by_default: true,
        }
    }
}

/// Specification for a service an extension offers to the host.
///
/// Services are registered during `on_load` and exposed by the host to the
/// rest of the application under `<extension-id>/<name>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Service name, unique within the owning extension
    pub name: String,
    /// What the service provides
    pub description: String,
}
