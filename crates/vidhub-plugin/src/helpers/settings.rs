//! Settings and storage accessors, scoped to one extension.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use vidhub_core::AppResult;

use crate::store::{PluginStore, PluginType};

/// A setting declared by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSettingOptions {
    /// Setting key.
    pub name: String,
    /// Label shown in the admin UI.
    #[serde(default)]
    pub label: Option<String>,
    /// Input type (`input`, `input-checkbox`, `select`, `markdown-text`, ...).
    #[serde(rename = "type")]
    pub setting_type: String,
    /// Value used while the admin has not set one.
    #[serde(default)]
    pub default: Option<Value>,
    /// Hidden from non-admin clients.
    #[serde(default = "default_private")]
    pub private: bool,
    /// Help text.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_private() -> bool {
    true
}

impl RegisterSettingOptions {
    /// Creates a private text input setting.
    pub fn new(name: &str, setting_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            setting_type: setting_type.to_string(),
            default: None,
            private: true,
            description: None,
        }
    }

    /// Sets the label.
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets visibility.
    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// Callback run when an admin changes a plugin's settings.
pub type SettingsChangeCallback =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Reads and writes one extension's settings.
#[derive(Clone)]
pub struct SettingsManager {
    pub(crate) name: String,
    pub(crate) plugin_type: PluginType,
    pub(crate) store: Arc<dyn PluginStore>,
    pub(crate) registered: Arc<RwLock<Vec<RegisterSettingOptions>>>,
    pub(crate) callbacks: Arc<RwLock<Vec<SettingsChangeCallback>>>,
}

impl SettingsManager {
    /// Reads a setting, falling back to its declared default.
    pub async fn get_setting(&self, key: &str) -> AppResult<Option<Value>> {
        let value = self.store.get_setting(&self.name, self.plugin_type, key).await?;
        if value.is_some() {
            return Ok(value);
        }
        Ok(self.default_of(key).await)
    }

    /// Reads several settings, falling back to declared defaults.
    pub async fn get_settings(&self, keys: &[String]) -> AppResult<Map<String, Value>> {
        let mut values = self
            .store
            .get_settings(&self.name, self.plugin_type, keys)
            .await?;

        for key in keys {
            if !values.contains_key(key) {
                if let Some(default) = self.default_of(key).await {
                    values.insert(key.clone(), default);
                }
            }
        }
        Ok(values)
    }

    /// Writes a setting.
    pub async fn set_setting(&self, key: &str, value: Value) -> AppResult<()> {
        self.store
            .set_setting(&self.name, self.plugin_type, key, value)
            .await
    }

    /// Registers a callback for settings changes.
    pub async fn on_settings_change<F, Fut>(&self, callback: F)
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let callback: SettingsChangeCallback =
            Arc::new(move |settings| callback(settings).boxed());
        self.callbacks.write().await.push(callback);
    }

    async fn default_of(&self, key: &str) -> Option<Value> {
        self.registered
            .read()
            .await
            .iter()
            .find(|s| s.name == key)
            .and_then(|s| s.default.clone())
    }
}

impl std::fmt::Debug for SettingsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsManager")
            .field("name", &self.name)
            .field("plugin_type", &self.plugin_type)
            .finish_non_exhaustive()
    }
}

/// Reads and writes one extension's private key-value storage.
#[derive(Clone)]
pub struct StorageManager {
    pub(crate) name: String,
    pub(crate) plugin_type: PluginType,
    pub(crate) store: Arc<dyn PluginStore>,
}

impl StorageManager {
    /// Reads a value.
    pub async fn get_data(&self, key: &str) -> AppResult<Option<Value>> {
        self.store.get_data(&self.name, self.plugin_type, key).await
    }

    /// Writes a value.
    pub async fn store_data(&self, key: &str, value: Value) -> AppResult<()> {
        self.store
            .store_data(&self.name, self.plugin_type, key, value)
            .await
    }
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
