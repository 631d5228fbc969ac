//! ExtensionHost - drives extensions through their lifecycle
//!
//! The host owns the registry of loaded extensions and moves each one
//! through `Unloaded -> Loaded -> Enabled <-> Disabled -> Unloaded`. Batch
//! loading is best-effort: one broken extension never prevents the rest
//! from activating. Single-extension operations surface faults to the
//! caller as values, since an explicit operator action deserves an
//! explicit answer.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::discovery::{self, BuiltinRegistry};
use super::error::ExtensionHostError;
use super::loader::IsolationUnit;
use super::sequencer;
use super::services::ServiceRegistry;
use super::state::StateStore;
use tiller_extension_api::{
    Extension, ExtensionConfig, ExtensionContext, ExtensionDescriptor, ServiceSpec,
};

/// A loaded extension with its runtime state.
///
/// Field order matters for teardown: `instance` must drop before `unit`
/// releases the library that holds the instance's code.
struct LoadedExtension {
    /// The extension instance
    instance: Box<dyn Extension>,
    /// Cached descriptor, stable for the instance's lifetime
    descriptor: ExtensionDescriptor,
    /// Context passed to lifecycle callbacks
    context: ExtensionContext,
    /// Package path; `None` for built-ins
    origin: Option<PathBuf>,
    /// Owning isolation unit; `None` for built-ins
    unit: Option<IsolationUnit>,
    /// Whether `on_enable` has succeeded since the last disable/unload
    enabled: bool,
    /// Whether `on_load` faulted; a load-faulted extension is never enabled
    load_faulted: bool,
    /// Set once `unload` has run; late holders of the record must treat it
    /// as gone
    unloaded: bool,
    loaded_at: DateTime<Utc>,
    /// Accumulated fault messages, append-only until the record is removed
    errors: Vec<String>,
}

impl LoadedExtension {
    fn status(&self) -> ExtensionStatus {
        ExtensionStatus {
            id: self.descriptor.id.clone(),
            name: self.descriptor.name.clone(),
            version: self.descriptor.version.clone(),
            enabled: self.enabled,
            errors: self.errors.clone(),
            origin: self.origin.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Configuration for the extension host
pub struct ExtensionHostConfig {
    /// Directory scanned for drop-in packages; also holds per-extension
    /// data directories
    pub extension_dir: PathBuf,
    /// Location of the persisted enabled-state document
    pub state_path: PathBuf,
    /// Built-in extension constructors
    pub builtins: BuiltinRegistry,
}

impl Default for ExtensionHostConfig {
    fn default() -> Self {
        let extension_dir = tiller_paths::extensions_dir();
        Self {
            state_path: extension_dir.join("state.json"),
            extension_dir,
            builtins: BuiltinRegistry::new(),
        }
    }
}

/// Point-in-time view of one extension, for the administrative surface
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionStatus {
    pub id: String,
    pub name: String,
    pub version: String,
    pub enabled: bool,
    pub errors: Vec<String>,
    pub origin: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

/// Summary of one `discover_and_load_all` pass
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Candidates found, including ones that failed discovery
    pub discovered: usize,
    /// Records created (including load-faulted ones, which stay visible)
    pub loaded: usize,
    /// Extensions that reached Enabled
    pub activated: usize,
    /// Extensions with a fault recorded during this pass
    pub faulted: usize,
    /// Activation decisions made before cancellation (if any)
    pub processed: usize,
    /// Whether the pass stopped early on the cancellation signal
    pub cancelled: bool,
}

/// The extension host: discovery, loading, activation order, enable/disable
/// state, and unloading.
pub struct ExtensionHost {
    extension_dir: PathBuf,
    builtins: BuiltinRegistry,
    /// id -> record; structural changes under the write lock, per-extension
    /// serialization via each record's async mutex
    registry: RwLock<HashMap<String, Arc<Mutex<LoadedExtension>>>>,
    /// Services committed by loaded extensions
    services: RwLock<ServiceRegistry>,
    /// Persisted enabled-state; writes are read-modify-write under this lock
    state: Mutex<StateStore>,
}

impl ExtensionHost {
    /// Create a new extension host. Reads the persisted state document once.
    pub fn new(config: ExtensionHostConfig) -> Result<Self, ExtensionHostError> {
        let state = StateStore::load(&config.state_path)?;
        Ok(Self {
            extension_dir: config.extension_dir,
            builtins: config.builtins,
            registry: RwLock::new(HashMap::new()),
            services: RwLock::new(ServiceRegistry::new()),
            state: Mutex::new(state),
        })
    }

    /// Discover all candidates, load each into the registry, and activate
    /// them in dependency order.
    ///
    /// Best-effort throughout: discovery and load faults are recorded
    /// per-extension and never abort the pass. The one batch-level fault is
    /// a dependency cycle, returned before any activation is attempted. If
    /// `cancel` fires mid-batch, already-activated extensions stay
    /// activated and the report says how far the pass got.
    pub async fn discover_and_load_all(
        &self,
        cancel: CancellationToken,
    ) -> Result<LoadReport, ExtensionHostError> {
        let outcome = discovery::scan(&self.builtins, &self.extension_dir)?;
        let mut report = LoadReport {
            discovered: outcome.candidates.len() + outcome.faults.len(),
            faulted: outcome.faults.len(),
            ..Default::default()
        };

        for fault in &outcome.faults {
            tracing::error!(
                origin = %fault.origin,
                error = %fault.message,
                "Extension candidate skipped"
            );
        }

        for candidate in outcome.candidates {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::warn!(loaded = report.loaded, "Extension load pass cancelled");
                return Ok(report);
            }
            match self.load_candidate(candidate).await {
                Ok(load_faulted) => {
                    report.loaded += 1;
                    if load_faulted {
                        report.faulted += 1;
                    }
                }
                Err(e) => {
                    report.faulted += 1;
                    tracing::error!(error = %e, "Extension rejected during load");
                }
            }
        }

        // A cycle fails the whole batch before anything activates; the
        // records stay registered (loaded, not enabled) so the fault is
        // inspectable.
        let descriptors = self.descriptors().await;
        let order = sequencer::activation_order(&descriptors)?;

        let desired = {
            let state = self.state.lock().await;
            order
                .iter()
                .map(|id| {
                    let default = descriptors
                        .iter()
                        .find(|d| &d.id == id)
                        .map(|d| d.enabled_by_default)
                        .unwrap_or(false);
                    (id.clone(), state.get(id).unwrap_or(default))
                })
                .collect::<HashMap<String, bool>>()
        };

        for id in &order {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::warn!(
                    processed = report.processed,
                    "Extension activation pass cancelled"
                );
                break;
            }
            report.processed += 1;

            let Some(record) = self.registry.read().get(id).cloned() else {
                continue;
            };
            let mut ext = record.lock().await;
            if ext.enabled || ext.load_faulted || ext.unloaded {
                continue;
            }
            if !desired.get(id).copied().unwrap_or(false) {
                tracing::debug!(extension = %id, "Extension not enabled (per state)");
                continue;
            }

            let LoadedExtension {
                instance, context, ..
            } = &mut *ext;
            match instance.on_enable(context).await {
                Ok(()) => {
                    ext.enabled = true;
                    report.activated += 1;
                    tracing::info!(
                        extension = %id,
                        version = %ext.descriptor.version,
                        "Extension enabled"
                    );
                }
                Err(e) => {
                    ext.errors.push(format!("on_enable: {e}"));
                    report.faulted += 1;
                    tracing::error!(extension = %id, error = %e, "Extension failed to enable");
                }
            }
        }

        Ok(report)
    }

    /// Register one candidate: validate its descriptor, run `on_load`,
    /// commit its services. Returns whether `on_load` faulted (the record
    /// is kept either way so the error stays visible).
    async fn load_candidate(
        &self,
        candidate: discovery::Candidate,
    ) -> Result<bool, ExtensionHostError> {
        let descriptor = candidate.instance.descriptor();
        let origin_label = candidate
            .origin
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string());

        if descriptor.id.is_empty() {
            return Err(ExtensionHostError::EmptyId {
                origin: origin_label,
            });
        }
        if self.registry.read().contains_key(&descriptor.id) {
            return Err(ExtensionHostError::DuplicateId {
                id: descriptor.id,
                origin: origin_label,
            });
        }

        let data_dir = self.extension_dir.join(&descriptor.id);
        let config = ExtensionConfig::load(&data_dir.join("config.toml")).unwrap_or_else(|e| {
            tracing::warn!(extension = %descriptor.id, error = %e, "Ignoring invalid config");
            ExtensionConfig::empty()
        });
        let context = ExtensionContext::with_config(descriptor.id.clone(), data_dir, config);

        let mut record = LoadedExtension {
            instance: candidate.instance,
            descriptor,
            context,
            origin: candidate.origin,
            unit: candidate.unit,
            enabled: false,
            load_faulted: false,
            unloaded: false,
            loaded_at: Utc::now(),
            errors: Vec::new(),
        };

        let LoadedExtension {
            instance, context, ..
        } = &mut record;
        match instance.on_load(context).await {
            Ok(()) => {
                let services = record.context.take_pending_services();
                self.services.write().register(&record.descriptor.id, services);
                tracing::info!(
                    extension = %record.descriptor.id,
                    version = %record.descriptor.version,
                    "Extension loaded"
                );
            }
            Err(e) => {
                record.errors.push(format!("on_load: {e}"));
                record.load_faulted = true;
                tracing::error!(
                    extension = %record.descriptor.id,
                    error = %e,
                    "Extension failed to load"
                );
            }
        }

        let load_faulted = record.load_faulted;
        let id = record.descriptor.id.clone();
        self.registry
            .write()
            .insert(id, Arc::new(Mutex::new(record)));
        Ok(load_faulted)
    }

    /// Enable an extension by id.
    ///
    /// No-op returning success if already enabled. Persists the new state
    /// on success; on fault the extension stays disabled and the fault is
    /// both recorded on the record and returned.
    pub async fn enable(&self, id: &str) -> Result<(), ExtensionHostError> {
        let record = self.record(id)?;
        let mut ext = record.lock().await;
        if ext.unloaded {
            return Err(ExtensionHostError::NotFound { id: id.to_string() });
        }
        if ext.enabled {
            tracing::debug!(extension = %id, "Extension already enabled");
            return Ok(());
        }
        if ext.load_faulted {
            return Err(ExtensionHostError::Load {
                id: id.to_string(),
                message: "on_load faulted; extension cannot be enabled".to_string(),
            });
        }

        let LoadedExtension {
            instance, context, ..
        } = &mut *ext;
        if let Err(e) = instance.on_enable(context).await {
            let message = e.to_string();
            ext.errors.push(format!("on_enable: {message}"));
            tracing::error!(extension = %id, error = %message, "Extension failed to enable");
            return Err(ExtensionHostError::Activation {
                id: id.to_string(),
                message,
            });
        }

        ext.enabled = true;
        // Persist while still holding the record mutex: releasing it first
        // would let a racing disable land its write between our flag change
        // and our persist, leaving the document contradicting the registry.
        self.persist(id, true).await?;
        drop(ext);
        tracing::info!(extension = %id, "Extension enabled");
        Ok(())
    }

    /// Disable an extension by id. Symmetric with [`enable`](Self::enable):
    /// no-op if not enabled; on fault the extension stays enabled.
    pub async fn disable(&self, id: &str) -> Result<(), ExtensionHostError> {
        let record = self.record(id)?;
        let mut ext = record.lock().await;
        if ext.unloaded {
            return Err(ExtensionHostError::NotFound { id: id.to_string() });
        }
        if !ext.enabled {
            tracing::debug!(extension = %id, "Extension already disabled");
            return Ok(());
        }

        let LoadedExtension {
            instance, context, ..
        } = &mut *ext;
        if let Err(e) = instance.on_disable(context).await {
            let message = e.to_string();
            ext.errors.push(format!("on_disable: {message}"));
            tracing::error!(extension = %id, error = %message, "Extension failed to disable");
            return Err(ExtensionHostError::Activation {
                id: id.to_string(),
                message,
            });
        }

        ext.enabled = false;
        // Same ordering as enable: the record mutex must cover the persist
        // so the document always reflects the last completed transition.
        self.persist(id, false).await?;
        drop(ext);
        tracing::info!(extension = %id, "Extension disabled");
        Ok(())
    }

    /// Unload an extension: disable it if enabled, run `on_unload`, release
    /// its isolation unit, and remove the record.
    ///
    /// Best-effort: cleanup faults are recorded and returned, but the
    /// record is removed regardless; a broken extension cannot block the
    /// host from forgetting it. The extension must be rediscovered from
    /// disk to be loaded again.
    pub async fn unload(&self, id: &str) -> Result<(), ExtensionHostError> {
        let record = self.record(id)?;
        let mut ext = record.lock().await;
        if ext.unloaded {
            return Err(ExtensionHostError::NotFound { id: id.to_string() });
        }

        let mut failures: Vec<String> = Vec::new();

        if ext.enabled {
            let LoadedExtension {
                instance, context, ..
            } = &mut *ext;
            if let Err(e) = instance.on_disable(context).await {
                let message = format!("on_disable: {e}");
                tracing::warn!(extension = %id, error = %e, "Disable faulted during unload");
                ext.errors.push(message.clone());
                failures.push(message);
            }
            // Teardown continues regardless
            ext.enabled = false;
        }

        {
            let LoadedExtension {
                instance, context, ..
            } = &mut *ext;
            if let Err(e) = instance.on_unload(context).await {
                let message = format!("on_unload: {e}");
                tracing::warn!(extension = %id, error = %e, "Unload callback faulted");
                ext.errors.push(message.clone());
                failures.push(message);
            }
        }

        ext.unloaded = true;
        drop(ext);

        // Removing the record drops the instance first and then the
        // isolation unit, releasing the package's code and state.
        self.registry.write().remove(id);
        self.services.write().unregister(id);
        tracing::info!(extension = %id, "Extension unloaded");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExtensionHostError::Unload {
                id: id.to_string(),
                message: failures.join("; "),
            })
        }
    }

    /// Read-only lookup of one extension's status
    pub async fn get(&self, id: &str) -> Option<ExtensionStatus> {
        let record = self.registry.read().get(id).cloned()?;
        let ext = record.lock().await;
        if ext.unloaded {
            return None;
        }
        Some(ext.status())
    }

    /// Status of every loaded extension, sorted by id
    pub async fn status(&self) -> Vec<ExtensionStatus> {
        let records: Vec<Arc<Mutex<LoadedExtension>>> =
            self.registry.read().values().cloned().collect();

        let mut statuses = Vec::with_capacity(records.len());
        for record in records {
            let ext = record.lock().await;
            if !ext.unloaded {
                statuses.push(ext.status());
            }
        }
        statuses.sort_by(|a, b| a.id.cmp(&b.id));
        statuses
    }

    /// Number of loaded extensions
    pub fn extension_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Services registered by one extension, sorted by name
    pub fn services_for(&self, id: &str) -> Vec<ServiceSpec> {
        self.services.read().services_for(id)
    }

    fn record(&self, id: &str) -> Result<Arc<Mutex<LoadedExtension>>, ExtensionHostError> {
        self.registry
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ExtensionHostError::NotFound { id: id.to_string() })
    }

    async fn persist(&self, id: &str, enabled: bool) -> Result<(), ExtensionHostError> {
        let mut state = self.state.lock().await;
        state.set_enabled(id, enabled)
    }

    async fn descriptors(&self) -> Vec<ExtensionDescriptor> {
        let records: Vec<Arc<Mutex<LoadedExtension>>> =
            self.registry.read().values().cloned().collect();

        let mut descriptors = Vec::with_capacity(records.len());
        for record in records {
            let ext = record.lock().await;
            if !ext.unloaded {
                descriptors.push(ext.descriptor.clone());
            }
        }
        descriptors
    }
}
