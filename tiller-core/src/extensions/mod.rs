//! Extension system for tiller
//!
//! Extensions plug optional functionality into the server without forking
//! it: audit trails, CRM enrichment, SMS campaign hooks. They arrive either
//! as built-ins registered at startup or as drop-in packages discovered in
//! the extension directory, and the host drives each one through
//! `Unloaded -> Loaded -> Enabled <-> Disabled -> Unloaded`.
//!
//! Module map:
//! - [`host`]: the lifecycle coordinator and its registry
//! - [`discovery`]: candidate enumeration (built-ins + directory scan)
//! - [`loader`]: isolation units around drop-in packages
//! - [`sequencer`]: dependency-ordered activation
//! - [`services`]: the capability registry extensions publish into
//! - [`state`]: enabled-state persisted across restarts

pub mod discovery;
pub mod error;
pub mod host;
pub mod loader;
pub mod sequencer;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use discovery::{BuiltinRegistry, ExtensionFactory};
pub use error::ExtensionHostError;
pub use host::{ExtensionHost, ExtensionHostConfig, ExtensionStatus, LoadReport};
pub use loader::IsolationUnit;
pub use sequencer::activation_order;
pub use services::ServiceRegistry;
pub use state::StateStore;
