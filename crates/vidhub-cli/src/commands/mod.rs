//! CLI command definitions and dispatch.

pub mod config;
pub mod plugins;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use vidhub_core::config::AppConfig;
use vidhub_core::error::AppError;
use vidhub_plugin::{DynamicModuleLoader, FilePluginStore, PluginManager};

use crate::output::OutputFormat;

/// VidHub extension administration
#[derive(Debug, Parser)]
#[command(name = "vidhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Plugin and theme management
    Plugins(plugins::PluginArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Plugins(args) => plugins::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_from(config_path)
}

/// Helper: plugin manager over the on-disk store, loading real libraries
pub async fn build_manager(config: &AppConfig) -> Result<PluginManager, AppError> {
    let store = FilePluginStore::open(Path::new(&config.plugins.store_path)).await?;
    let loader = DynamicModuleLoader::new(&config.plugins.directory_path().join(".shadow"));

    PluginManager::builder(&config.plugins)
        .store(Arc::new(store))
        .loader(Arc::new(loader))
        .build()
}
