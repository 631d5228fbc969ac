//! Audit Extension - a simple example extension for tiller
//!
//! This extension demonstrates:
//! - Basic extension structure with the `export_extension!` macro
//! - Implementing the `Extension` trait
//! - Registering a service during `on_load`
//! - Appending to a data file in the extension's data directory
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! mkdir -p ~/.local/share/tiller/extensions
//! cp target/release/libaudit_extension.so ~/.local/share/tiller/extensions/audit-log.so
//! tiller extension enable audit-log
//! ```

use tiller_extension_api::{
    Extension, ExtensionContext, ExtensionDescriptor, ExtensionError, ServiceSpec, async_trait,
    export_extension,
};

/// Records when the audit trail starts and stops, to its own data file.
#[derive(Default)]
pub struct AuditExtension {
    /// Number of enable/disable cycles this instance has seen
    sessions: u32,
}

impl AuditExtension {
    fn append(&self, ctx: &ExtensionContext, line: &str) -> Result<(), ExtensionError> {
        std::fs::create_dir_all(ctx.data_dir())?;
        let path = ctx.data_dir().join("audit.log");
        let mut trail = std::fs::read_to_string(&path).unwrap_or_default();
        trail.push_str(line);
        trail.push('\n');
        std::fs::write(&path, trail)?;
        Ok(())
    }
}

#[async_trait]
impl Extension for AuditExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor {
            id: "audit-log".to_string(),
            name: "Audit Log".to_string(),
            description: "Keeps an append-only trail of sales operations".to_string(),
            version: "0.1.0".to_string(),
            author: "tiller-team".to_string(),
            ..Default::default()
        }
    }

    async fn on_load(&mut self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        ctx.register_service(ServiceSpec {
            name: "trail".to_string(),
            description: "Append-only audit trail".to_string(),
        })?;
        ctx.log_info("Audit extension loaded");
        Ok(())
    }

    async fn on_enable(&mut self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        self.sessions += 1;
        self.append(ctx, &format!("audit session {} started", self.sessions))?;
        ctx.log_info("Audit trail active");
        Ok(())
    }

    async fn on_disable(&mut self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        self.append(ctx, &format!("audit session {} stopped", self.sessions))?;
        Ok(())
    }

    async fn on_unload(&mut self, ctx: &mut ExtensionContext) -> Result<(), ExtensionError> {
        ctx.log_info("Audit extension unloading");
        Ok(())
    }
}

// This macro generates the C ABI entry points for dynamic loading
export_extension!(AuditExtension);
