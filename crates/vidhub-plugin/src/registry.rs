//! Plugin registry: registered extensions and their lifecycle state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use vidhub_core::{AppError, AppResult};

use crate::helpers::RegisterHelpers;
use crate::loader::PluginLibrary;
use crate::manifest::ClientScript;
use crate::store::PluginType;

/// Lifecycle state of an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Not in the registry.
    Unloaded,
    /// Manifest read, code being loaded and `register` running.
    Loading,
    /// In the registry.
    Registered,
    /// Being torn down.
    Unloading,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Loading => write!(f, "loading"),
            Self::Registered => write!(f, "registered"),
            Self::Unloading => write!(f, "unloading"),
        }
    }
}

/// Server side of a registered plugin. Themes have none.
#[derive(Debug, Clone)]
pub struct PluginRuntime {
    /// Capability object handed to `register`.
    pub helpers: RegisterHelpers,
    /// Entry points.
    pub library: PluginLibrary,
}

/// A successfully loaded extension.
///
/// Never mutated in place; an update replaces the whole entry.
#[derive(Debug, Clone)]
pub struct RegisteredPlugin {
    /// Namespaced name.
    pub npm_name: String,
    /// Short name.
    pub name: String,
    /// Kind.
    pub plugin_type: PluginType,
    /// Version from the manifest.
    pub version: String,
    /// Description from the manifest.
    pub description: String,
    /// Host engine range from the manifest.
    pub engine_version: String,
    /// Package directory.
    pub path: PathBuf,
    /// Static directory alias → relative path.
    pub static_dirs: BTreeMap<String, String>,
    /// Client script path → script entry.
    pub client_scripts: BTreeMap<String, ClientScript>,
    /// CSS files, relative to `path`.
    pub css: Vec<String>,
    /// Plugin code; `None` for themes.
    pub runtime: Option<PluginRuntime>,
}

/// Serializable summary of a registered extension.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPluginInfo {
    /// Namespaced name.
    pub npm_name: String,
    /// Short name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Description.
    pub description: String,
    /// Kind.
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    /// Static directory aliases.
    pub static_dirs: BTreeMap<String, String>,
    /// Client scripts.
    pub client_scripts: BTreeMap<String, ClientScript>,
    /// CSS files.
    pub css: Vec<String>,
}

impl From<&RegisteredPlugin> for RegisteredPluginInfo {
    fn from(p: &RegisteredPlugin) -> Self {
        Self {
            npm_name: p.npm_name.clone(),
            name: p.name.clone(),
            version: p.version.clone(),
            description: p.description.clone(),
            plugin_type: p.plugin_type,
            static_dirs: p.static_dirs.clone(),
            client_scripts: p.client_scripts.clone(),
            css: p.css.clone(),
        }
    }
}

/// Registered extensions in registration order, plus per-name state.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<RegisteredPlugin>>>,
    states: RwLock<HashMap<String, PluginState>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extension; at most one entry per namespaced name.
    pub async fn insert(&self, plugin: RegisteredPlugin) -> AppResult<Arc<RegisteredPlugin>> {
        let mut plugins = self.plugins.write().await;
        if plugins.iter().any(|p| p.npm_name == plugin.npm_name) {
            return Err(AppError::conflict(format!(
                "'{}' is already registered",
                plugin.npm_name
            )));
        }

        let plugin = Arc::new(plugin);
        plugins.push(plugin.clone());
        drop(plugins);

        self.set_state(&plugin.npm_name, PluginState::Registered).await;
        info!(npm_name = %plugin.npm_name, version = %plugin.version, "Plugin registered");
        Ok(plugin)
    }

    /// Removes an extension, returning it.
    pub async fn remove(&self, npm_name: &str) -> Option<Arc<RegisteredPlugin>> {
        let mut plugins = self.plugins.write().await;
        let pos = plugins.iter().position(|p| p.npm_name == npm_name)?;
        let removed = plugins.remove(pos);
        debug!(npm_name = %npm_name, "Plugin removed from registry");
        Some(removed)
    }

    /// Looks an extension up by namespaced name.
    pub async fn get(&self, npm_name: &str) -> Option<Arc<RegisteredPlugin>> {
        self.plugins
            .read()
            .await
            .iter()
            .find(|p| p.npm_name == npm_name)
            .cloned()
    }

    /// Looks an extension up by short name and kind.
    pub async fn find_by_short_name(
        &self,
        name: &str,
        plugin_type: PluginType,
    ) -> Option<Arc<RegisteredPlugin>> {
        self.get(&plugin_type.build_npm_name(name)).await
    }

    /// Whether an extension is registered.
    pub async fn is_registered(&self, npm_name: &str) -> bool {
        self.get(npm_name).await.is_some()
    }

    /// All extensions, in registration order.
    pub async fn list(&self) -> Vec<Arc<RegisteredPlugin>> {
        self.plugins.read().await.clone()
    }

    /// Extensions of one kind, in registration order.
    pub async fn list_by_type(&self, plugin_type: PluginType) -> Vec<Arc<RegisteredPlugin>> {
        self.plugins
            .read()
            .await
            .iter()
            .filter(|p| p.plugin_type == plugin_type)
            .cloned()
            .collect()
    }

    /// Number of registered extensions.
    pub async fn count(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// Lifecycle state of a name; `Unloaded` if never seen.
    pub async fn state(&self, npm_name: &str) -> PluginState {
        self.states
            .read()
            .await
            .get(npm_name)
            .copied()
            .unwrap_or(PluginState::Unloaded)
    }

    /// Records a lifecycle transition.
    pub async fn set_state(&self, npm_name: &str, state: PluginState) {
        let mut states = self.states.write().await;
        let previous = match state {
            PluginState::Unloaded => states.remove(npm_name),
            _ => states.insert(npm_name.to_string(), state),
        };
        debug!(
            npm_name = %npm_name,
            from = %previous.unwrap_or(PluginState::Unloaded),
            to = %state,
            "Plugin state changed"
        );
    }
}
