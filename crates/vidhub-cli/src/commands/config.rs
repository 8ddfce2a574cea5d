//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use vidhub_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Server", &config.server.bind_address());
                output::print_kv("Extensions directory", &config.plugins.directory);
                output::print_kv("Package manager", &config.plugins.package_manager);
                output::print_kv(
                    "Plugin index",
                    if config.plugins.index_enabled {
                        &config.plugins.index_url
                    } else {
                        "disabled"
                    },
                );
                output::print_kv(
                    "Hook timeout",
                    &match config.plugins.hook_timeout() {
                        Some(t) => format!("{}s", t.as_secs()),
                        None => "none".to_string(),
                    },
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
    }

    Ok(())
}
