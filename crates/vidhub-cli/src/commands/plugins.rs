//! Extension management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use vidhub_core::error::AppError;
use vidhub_plugin::{InstallOptions, PluginRecord, PluginType};

use crate::output::{self, OutputFormat};

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginArgs {
    /// Plugin subcommand
    #[command(subcommand)]
    pub command: PluginCommand,
}

/// Plugin subcommands
#[derive(Debug, Subcommand)]
pub enum PluginCommand {
    /// List installed extensions
    List {
        /// Only plugins or only themes
        #[arg(short = 't', long = "type", value_enum)]
        plugin_type: Option<TypeFilter>,
        /// Include uninstalled extensions
        #[arg(long)]
        all: bool,
    },
    /// Install an extension
    Install {
        /// Namespaced package name, or a directory with --from-disk
        target: String,
        /// Exact version
        #[arg(long)]
        version: Option<String>,
        /// Install from a local directory
        #[arg(long)]
        from_disk: bool,
    },
    /// Update an installed extension
    Update {
        /// Namespaced package name, or a directory with --from-disk
        target: String,
        /// Exact version (defaults to the latest compatible one)
        #[arg(long)]
        version: Option<String>,
        /// Update from a local directory
        #[arg(long)]
        from_disk: bool,
    },
    /// Uninstall an extension
    Uninstall {
        /// Namespaced package name
        npm_name: String,
    },
}

/// Kind filter for `list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TypeFilter {
    /// Server plugins
    Plugin,
    /// Themes
    Theme,
}

impl From<TypeFilter> for PluginType {
    fn from(filter: TypeFilter) -> Self {
        match filter {
            TypeFilter::Plugin => PluginType::Plugin,
            TypeFilter::Theme => PluginType::Theme,
        }
    }
}

/// Extension display row for table output
#[derive(Debug, Serialize, Tabled)]
struct PluginRow {
    /// Namespaced name
    npm_name: String,
    /// Kind
    #[tabled(rename = "type")]
    plugin_type: String,
    /// Installed version
    version: String,
    /// Latest compatible version
    latest: String,
    /// Enabled flag
    enabled: bool,
    /// Uninstalled flag
    uninstalled: bool,
    /// Last update
    updated_at: String,
}

impl From<&PluginRecord> for PluginRow {
    fn from(r: &PluginRecord) -> Self {
        Self {
            npm_name: r.npm_name(),
            plugin_type: r.plugin_type.to_string(),
            version: r.version.clone(),
            latest: r.latest_version.clone().unwrap_or_default(),
            enabled: r.enabled,
            uninstalled: r.uninstalled,
            updated_at: r.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute plugin commands
pub async fn execute(
    args: &PluginArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let manager = super::build_manager(&config).await?;

    match &args.command {
        PluginCommand::List { plugin_type, all } => {
            let records = manager.store().list_all().await?;
            let wanted: Option<PluginType> = plugin_type.map(Into::into);

            let rows: Vec<PluginRow> = records
                .iter()
                .filter(|r| *all || !r.uninstalled)
                .filter(|r| wanted.is_none_or(|t| r.plugin_type == t))
                .map(PluginRow::from)
                .collect();

            output::print_list(&rows, format, "No extensions installed.");
        }
        PluginCommand::Install {
            target,
            version,
            from_disk,
        } => {
            let options = InstallOptions {
                target: target.clone(),
                version: version.clone(),
                from_disk: *from_disk,
                register: true,
            };
            let record = manager.install(options).await?;
            output::print_success(&format!(
                "Installed {} {}",
                record.npm_name(),
                record.version
            ));
        }
        PluginCommand::Update {
            target,
            version,
            from_disk,
        } => {
            let record = manager
                .update(target, version.as_deref(), *from_disk)
                .await?;
            output::print_success(&format!(
                "Updated {} to {}",
                record.npm_name(),
                record.version
            ));
        }
        PluginCommand::Uninstall { npm_name } => {
            manager.uninstall(npm_name, true).await?;
            output::print_success(&format!("Uninstalled {npm_name}"));
        }
    }

    Ok(())
}
