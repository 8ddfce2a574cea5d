//! Plugin system configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Extensions directory: package manifest, installed packages, data dirs.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Aggregated CSS file rewritten on every registry mutation.
    #[serde(default = "default_global_css_path")]
    pub global_css_path: String,
    /// External package manager command.
    #[serde(default = "default_package_manager")]
    pub package_manager: String,
    /// Base URL of the remote plugin index.
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Whether the remote index is queried for the latest compatible version.
    #[serde(default = "default_true")]
    pub index_enabled: bool,
    /// Per-handler hook deadline in seconds (0 = no deadline).
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_seconds: u64,
    /// Host engine version reported to the index and checked by manifests.
    #[serde(default = "default_host_version")]
    pub host_version: String,
    /// Whether to register all enabled extensions on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// JSON file backing the plugin metadata store.
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl PluginConfig {
    /// Root of the extensions directory.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }

    /// Hook deadline, `None` when disabled.
    pub fn hook_timeout(&self) -> Option<Duration> {
        match self.hook_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            global_css_path: default_global_css_path(),
            package_manager: default_package_manager(),
            index_url: default_index_url(),
            index_enabled: true,
            hook_timeout_seconds: default_hook_timeout(),
            host_version: default_host_version(),
            auto_load: true,
            store_path: default_store_path(),
        }
    }
}

fn default_plugin_directory() -> String {
    "./storage/plugins".to_string()
}

fn default_global_css_path() -> String {
    "./storage/assets/plugins-global.css".to_string()
}

fn default_package_manager() -> String {
    "yarn".to_string()
}

fn default_index_url() -> String {
    "https://packages.vidhub.example".to_string()
}

fn default_hook_timeout() -> u64 {
    30
}

fn default_host_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_store_path() -> String {
    "./storage/plugins/plugins.json".to_string()
}

fn default_true() -> bool {
    true
}
