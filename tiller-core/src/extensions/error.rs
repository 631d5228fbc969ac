//! Extension host error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the extension host
#[derive(Error, Debug)]
pub enum ExtensionHostError {
    /// Failed to load a dynamic library
    #[error("Failed to load extension library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// API version mismatch between the host and a package
    #[error("API version mismatch: host expects {expected}, package has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// A package exposes no extension implementation
    #[error("No extension implementation found in {path}")]
    NoExtension { path: PathBuf },

    /// A descriptor declared an empty id
    #[error("Extension from {origin} declares an empty id")]
    EmptyId { origin: String },

    /// A second extension declared an id that is already registered
    #[error("Duplicate extension id '{id}' (from {origin})")]
    DuplicateId { id: String, origin: String },

    /// `on_load` faulted, or the extension cannot be used because it did
    #[error("Extension '{id}' failed to load: {message}")]
    Load { id: String, message: String },

    /// `on_enable` or `on_disable` faulted
    #[error("Extension '{id}' failed to activate: {message}")]
    Activation { id: String, message: String },

    /// Operation requested on an id with no current record
    #[error("Extension '{id}' not found")]
    NotFound { id: String },

    /// `on_unload` or unit release faulted; the record was still removed
    #[error("Extension '{id}' faulted during unload: {message}")]
    Unload { id: String, message: String },

    /// The declared dependencies form a cycle
    #[error("Dependency cycle among extensions: {}", ids.join(", "))]
    DependencyCycle { ids: Vec<String> },

    /// Persisted-state store error (parsing, writing)
    #[error("State store error: {0}")]
    State(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
