//! JSON-file metadata store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use vidhub_core::{AppError, AppResult};

use super::{MemoryPluginStore, PluginRecord, PluginStore, PluginType};

/// Metadata store persisted as a JSON array of records.
///
/// Reads are served from memory; every write rewrites the file.
#[derive(Debug)]
pub struct FilePluginStore {
    path: PathBuf,
    inner: MemoryPluginStore,
    write_lock: Mutex<()>,
}

impl FilePluginStore {
    /// Opens the store, loading existing records if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let records: Vec<PluginRecord> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::Storage,
                    format!("Corrupt plugin store '{}'", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), records = records.len(), "Plugin store opened");

        Ok(Self {
            path,
            inner: MemoryPluginStore::with_records(records),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(&self) -> AppResult<()> {
        let records = self.inner.list_all().await?;
        let bytes = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Plugin store persisted");
        Ok(())
    }
}

#[async_trait]
impl PluginStore for FilePluginStore {
    async fn list_enabled(&self) -> AppResult<Vec<PluginRecord>> {
        self.inner.list_enabled().await
    }

    async fn list_all(&self) -> AppResult<Vec<PluginRecord>> {
        self.inner.list_all().await
    }

    async fn upsert(&self, record: PluginRecord) -> AppResult<PluginRecord> {
        let _guard = self.write_lock.lock().await;
        let stored = self.inner.upsert(record).await?;
        self.persist().await?;
        Ok(stored)
    }

    async fn load_by_npm_name(&self, npm_name: &str) -> AppResult<Option<PluginRecord>> {
        self.inner.load_by_npm_name(npm_name).await
    }

    async fn save(&self, record: PluginRecord) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.save(record).await?;
        self.persist().await
    }

    async fn get_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>> {
        self.inner.get_setting(name, plugin_type, key).await
    }

    async fn get_settings(
        &self,
        name: &str,
        plugin_type: PluginType,
        keys: &[String],
    ) -> AppResult<Map<String, Value>> {
        self.inner.get_settings(name, plugin_type, keys).await
    }

    async fn set_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.set_setting(name, plugin_type, key, value).await?;
        self.persist().await
    }

    async fn get_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>> {
        self.inner.get_data(name, plugin_type, key).await
    }

    async fn store_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.store_data(name, plugin_type, key, value).await?;
        self.persist().await
    }
}
