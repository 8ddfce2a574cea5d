//! In-memory metadata store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use vidhub_core::{AppError, AppResult};

use super::{PluginRecord, PluginStore, PluginType};

/// Metadata store backed by a vector, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPluginStore {
    records: RwLock<Vec<PluginRecord>>,
}

impl MemoryPluginStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given records.
    pub fn with_records(records: Vec<PluginRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    async fn update<T>(
        &self,
        name: &str,
        plugin_type: PluginType,
        f: impl FnOnce(&mut PluginRecord) -> T,
    ) -> AppResult<T> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.name == name && r.plugin_type == plugin_type)
            .ok_or_else(|| {
                AppError::not_found(format!("Unknown {plugin_type} '{name}'"))
            })?;

        let out = f(record);
        record.updated_at = Utc::now();
        Ok(out)
    }

    async fn read<T>(
        &self,
        name: &str,
        plugin_type: PluginType,
        f: impl FnOnce(&PluginRecord) -> T,
    ) -> AppResult<Option<T>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.name == name && r.plugin_type == plugin_type)
            .map(f))
    }
}

#[async_trait]
impl PluginStore for MemoryPluginStore {
    async fn list_enabled(&self) -> AppResult<Vec<PluginRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.enabled && !r.uninstalled)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<PluginRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn upsert(&self, record: PluginRecord) -> AppResult<PluginRecord> {
        let mut records = self.records.write().await;

        match records
            .iter_mut()
            .find(|r| r.name == record.name && r.plugin_type == record.plugin_type)
        {
            Some(existing) => {
                existing.version = record.version;
                existing.enabled = record.enabled;
                existing.uninstalled = record.uninstalled;
                existing.engine_version = record.engine_version;
                existing.description = record.description;
                existing.homepage = record.homepage;
                if record.latest_version.is_some() {
                    existing.latest_version = record.latest_version;
                }
                existing.updated_at = Utc::now();
                Ok(existing.clone())
            }
            None => {
                records.push(record.clone());
                Ok(record)
            }
        }
    }

    async fn load_by_npm_name(&self, npm_name: &str) -> AppResult<Option<PluginRecord>> {
        let Ok((plugin_type, name)) = PluginType::from_npm_name(npm_name) else {
            return Ok(None);
        };
        self.read(&name, plugin_type, Clone::clone).await
    }

    async fn save(&self, record: PluginRecord) -> AppResult<()> {
        let name = record.name.clone();
        self.update(&name, record.plugin_type, |existing| {
            *existing = record;
        })
        .await
    }

    async fn get_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>> {
        Ok(self
            .read(name, plugin_type, |r| r.settings.get(key).cloned())
            .await?
            .flatten())
    }

    async fn get_settings(
        &self,
        name: &str,
        plugin_type: PluginType,
        keys: &[String],
    ) -> AppResult<Map<String, Value>> {
        Ok(self
            .read(name, plugin_type, |r| {
                keys.iter()
                    .filter_map(|k| r.settings.get(k).map(|v| (k.clone(), v.clone())))
                    .collect()
            })
            .await?
            .unwrap_or_default())
    }

    async fn set_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()> {
        self.update(name, plugin_type, |r| {
            r.settings.insert(key.to_string(), value);
        })
        .await
    }

    async fn get_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>> {
        Ok(self
            .read(name, plugin_type, |r| r.storage.get(key).cloned())
            .await?
            .flatten())
    }

    async fn store_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()> {
        self.update(name, plugin_type, |r| {
            r.storage.insert(key.to_string(), value);
        })
        .await
    }
}
