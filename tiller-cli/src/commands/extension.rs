//! Extension management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;

use tiller_core::{ExtensionHost, ExtensionHostConfig};

/// Extension management arguments
#[derive(Args)]
pub struct ExtensionArgs {
    #[command(subcommand)]
    pub command: ExtensionCommands,
}

/// Extension subcommands
#[derive(Subcommand)]
pub enum ExtensionCommands {
    /// List installed extensions
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable an extension
    Enable {
        /// Extension id to enable
        id: String,
    },
    /// Disable an extension
    Disable {
        /// Extension id to disable
        id: String,
    },
    /// Unload an extension entirely
    Unload {
        /// Extension id to unload
        id: String,
    },
    /// Show extension details
    Info {
        /// Extension id
        id: String,
    },
}

/// Run extension command
pub async fn run(args: ExtensionArgs) -> Result<()> {
    let host = ExtensionHost::new(ExtensionHostConfig::default())?;

    // Every subcommand needs the current set of extensions
    let report = host.discover_and_load_all(CancellationToken::new()).await?;
    tracing::debug!(
        discovered = report.discovered,
        loaded = report.loaded,
        activated = report.activated,
        "Extension load pass complete"
    );

    match args.command {
        ExtensionCommands::List { json } => list_extensions(&host, json).await,
        ExtensionCommands::Enable { id } => enable_extension(&host, &id).await,
        ExtensionCommands::Disable { id } => disable_extension(&host, &id).await,
        ExtensionCommands::Unload { id } => unload_extension(&host, &id).await,
        ExtensionCommands::Info { id } => show_extension_info(&host, &id).await,
    }
}

async fn list_extensions(host: &ExtensionHost, json: bool) -> Result<()> {
    let statuses = host.status().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No extensions installed");
        println!();
        println!(
            "Extension directory: {}",
            tiller_paths::extensions_dir().display()
        );
        println!();
        println!("To install an extension, copy its package into that directory");
        println!("and run 'tiller extension list' again.");
        return Ok(());
    }

    for s in statuses {
        let marker = if !s.errors.is_empty() {
            "✗"
        } else if s.enabled {
            "✓"
        } else {
            "○"
        };
        println!("{} {} v{}    {}", marker, s.id, s.version, s.name);
    }

    Ok(())
}

async fn enable_extension(host: &ExtensionHost, id: &str) -> Result<()> {
    host.enable(id).await?;
    println!("Enabled extension: {}", id);
    Ok(())
}

async fn disable_extension(host: &ExtensionHost, id: &str) -> Result<()> {
    host.disable(id).await?;
    println!("Disabled extension: {}", id);
    Ok(())
}

async fn unload_extension(host: &ExtensionHost, id: &str) -> Result<()> {
    host.unload(id).await?;
    println!("Unloaded extension: {}", id);
    println!("It will be rediscovered on the next load pass unless its package is removed.");
    Ok(())
}

async fn show_extension_info(host: &ExtensionHost, id: &str) -> Result<()> {
    let Some(status) = host.get(id).await else {
        println!("Extension '{}' not found", id);
        println!();
        println!("Run 'tiller extension list' to see installed extensions.");
        return Ok(());
    };

    println!("Id:          {}", status.id);
    println!("Name:        {}", status.name);
    println!("Version:     {}", status.version);
    println!(
        "Origin:      {}",
        status
            .origin
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );
    println!("Loaded at:   {}", status.loaded_at.to_rfc3339());
    println!(
        "Status:      {}",
        if status.enabled { "Enabled" } else { "Disabled" }
    );

    if !status.errors.is_empty() {
        println!();
        println!("Recorded faults:");
        for error in &status.errors {
            println!("  {}", error);
        }
    }

    let services = host.services_for(id);
    if !services.is_empty() {
        println!();
        println!("Services:");
        for service in services {
            println!("  {}    {}", service.name, service.description);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_args_parsing() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(subcommand)]
            cmd: ExtensionCommands,
        }

        let cli = TestCli::parse_from(["test", "list"]);
        assert!(matches!(cli.cmd, ExtensionCommands::List { json: false }));

        let cli = TestCli::parse_from(["test", "list", "--json"]);
        assert!(matches!(cli.cmd, ExtensionCommands::List { json: true }));

        let cli = TestCli::parse_from(["test", "enable", "audit-log"]);
        assert!(matches!(cli.cmd, ExtensionCommands::Enable { id } if id == "audit-log"));

        let cli = TestCli::parse_from(["test", "disable", "audit-log"]);
        assert!(matches!(cli.cmd, ExtensionCommands::Disable { id } if id == "audit-log"));

        let cli = TestCli::parse_from(["test", "unload", "audit-log"]);
        assert!(matches!(cli.cmd, ExtensionCommands::Unload { id } if id == "audit-log"));

        let cli = TestCli::parse_from(["test", "info", "audit-log"]);
        assert!(matches!(cli.cmd, ExtensionCommands::Info { id } if id == "audit-log"));
    }
}
