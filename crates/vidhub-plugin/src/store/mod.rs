//! Extension metadata store: the persistent side of the plugin host.
//!
//! The host only talks to the [`PluginStore`] trait. Two backends ship with
//! the crate: [`MemoryPluginStore`] for tests and embedding, and
//! [`FilePluginStore`], which keeps the records in a JSON file.

pub mod file;
pub mod memory;
pub mod record;

use async_trait::async_trait;
use serde_json::{Map, Value};

use vidhub_core::AppResult;

pub use file::FilePluginStore;
pub use memory::MemoryPluginStore;
pub use record::{PLUGIN_PREFIX, PluginRecord, PluginType, THEME_PREFIX};

/// Persistent extension metadata.
///
/// Records are keyed by short name and kind.
#[async_trait]
pub trait PluginStore: Send + Sync + std::fmt::Debug + 'static {
    /// Records that are enabled and not uninstalled.
    async fn list_enabled(&self) -> AppResult<Vec<PluginRecord>>;

    /// Every record, including disabled and uninstalled ones.
    async fn list_all(&self) -> AppResult<Vec<PluginRecord>>;

    /// Inserts a record or refreshes the descriptive fields of an existing one.
    ///
    /// Settings, storage and creation time of an existing record are kept.
    async fn upsert(&self, record: PluginRecord) -> AppResult<PluginRecord>;

    /// Looks a record up by namespaced name.
    async fn load_by_npm_name(&self, npm_name: &str) -> AppResult<Option<PluginRecord>>;

    /// Overwrites an existing record.
    async fn save(&self, record: PluginRecord) -> AppResult<()>;

    /// Reads one setting value.
    async fn get_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>>;

    /// Reads several setting values; missing keys are absent from the result.
    async fn get_settings(
        &self,
        name: &str,
        plugin_type: PluginType,
        keys: &[String],
    ) -> AppResult<Map<String, Value>>;

    /// Writes one setting value.
    async fn set_setting(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()>;

    /// Reads one storage value.
    async fn get_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
    ) -> AppResult<Option<Value>>;

    /// Writes one storage value.
    async fn store_data(
        &self,
        name: &str,
        plugin_type: PluginType,
        key: &str,
        value: Value,
    ) -> AppResult<()>;
}
