//! Minimal in-process extension for host unit tests

use tiller_extension_api::{Extension, ExtensionDescriptor, async_trait};

/// Bare extension with a fixed id and default lifecycle callbacks
pub struct NamedExtension {
    id: String,
}

impl NamedExtension {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl Extension for NamedExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor {
            id: self.id.clone(),
            name: self.id.clone(),
            ..Default::default()
        }
    }
}
