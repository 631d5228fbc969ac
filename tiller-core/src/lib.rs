//! tiller-core - extension lifecycle engine for the tiller server
//!
//! Houses the [`extensions`] subsystem: discovery of drop-in packages and
//! built-ins, dependency-ordered activation, persisted enabled-state, and
//! unloading with fault isolation.

pub mod extensions;

pub use extensions::{
    BuiltinRegistry, ExtensionHost, ExtensionHostConfig, ExtensionHostError, ExtensionStatus,
    LoadReport,
};
