//! Extension kinds and persisted extension records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vidhub_core::{AppError, AppResult};

/// Namespace prefix of plugin packages.
pub const PLUGIN_PREFIX: &str = "vidhub-plugin-";
/// Namespace prefix of theme packages.
pub const THEME_PREFIX: &str = "vidhub-theme-";

/// Kind of extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    /// Server and client code.
    Plugin,
    /// Client assets only.
    Theme,
}

impl PluginType {
    /// Namespace prefix of this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Plugin => PLUGIN_PREFIX,
            Self::Theme => THEME_PREFIX,
        }
    }

    /// Builds the namespaced name from a short name.
    pub fn build_npm_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix(), name)
    }

    /// Splits a namespaced name into its kind and short name.
    pub fn from_npm_name(npm_name: &str) -> AppResult<(Self, String)> {
        if let Some(name) = npm_name.strip_prefix(PLUGIN_PREFIX) {
            return Ok((Self::Plugin, name.to_string()));
        }
        if let Some(name) = npm_name.strip_prefix(THEME_PREFIX) {
            return Ok((Self::Theme, name.to_string()));
        }
        Err(AppError::validation(format!(
            "'{npm_name}' is neither a plugin nor a theme name"
        )))
    }

    /// Returns the string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted metadata of an installed extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    /// Short name (without namespace prefix).
    pub name: String,
    /// Kind.
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    /// Installed version.
    pub version: String,
    /// Latest version known from the plugin index.
    #[serde(default)]
    pub latest_version: Option<String>,
    /// Whether the extension is loaded at boot.
    pub enabled: bool,
    /// Whether the package was removed.
    pub uninstalled: bool,
    /// Host engine range declared by the manifest.
    #[serde(default)]
    pub engine_version: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Project homepage.
    #[serde(default)]
    pub homepage: String,
    /// Setting values.
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Private key-value storage.
    #[serde(default)]
    pub storage: Map<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl PluginRecord {
    /// Creates an enabled, installed record.
    pub fn new(name: &str, plugin_type: PluginType, version: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            plugin_type,
            version: version.to_string(),
            latest_version: None,
            enabled: true,
            uninstalled: false,
            engine_version: String::new(),
            description: String::new(),
            homepage: String::new(),
            settings: Map::new(),
            storage: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Namespaced name.
    pub fn npm_name(&self) -> String {
        self.plugin_type.build_npm_name(&self.name)
    }
}
