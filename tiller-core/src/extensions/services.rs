//! Service registry for extension-provided capabilities

use std::collections::HashMap;
use tiller_extension_api::ServiceSpec;

/// Registry of all services registered by loaded extensions.
///
/// Services are committed after a successful `on_load` and removed
/// wholesale when the owning extension is unloaded.
pub struct ServiceRegistry {
    /// Map from fully qualified name (`<extension-id>/<service>`) to
    /// registration info
    services: HashMap<String, RegisteredService>,
}

/// A service registered by an extension
pub struct RegisteredService {
    /// Id of the extension that owns this service
    pub extension_id: String,
    /// Service specification
    pub spec: ServiceSpec,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register services for an extension.
    ///
    /// Services are stored under `<extension-id>/<name>`.
    pub fn register(&mut self, extension_id: &str, services: Vec<ServiceSpec>) {
        for spec in services {
            let full_name = format!("{}/{}", extension_id, spec.name);
            self.services.insert(
                full_name,
                RegisteredService {
                    extension_id: extension_id.to_string(),
                    spec,
                },
            );
        }
    }

    /// Find a service by its fully qualified name
    pub fn find(&self, full_name: &str) -> Option<&RegisteredService> {
        self.services.get(full_name)
    }

    /// All services registered by one extension
    pub fn services_for(&self, extension_id: &str) -> Vec<ServiceSpec> {
        let mut specs: Vec<ServiceSpec> = self
            .services
            .values()
            .filter(|s| s.extension_id == extension_id)
            .map(|s| s.spec.clone())
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Get all registered services
    pub fn all_services(&self) -> impl Iterator<Item = (&str, &RegisteredService)> {
        self.services.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Unregister all services for an extension
    pub fn unregister(&mut self, extension_id: &str) {
        self.services.retain(|_, v| v.extension_id != extension_id);
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
