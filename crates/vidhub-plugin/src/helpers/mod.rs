//! Register helpers: the capability object handed to a plugin's `register`.
//!
//! One [`RegisterHelpers`] exists per loaded plugin. Everything it exposes is
//! scoped to that plugin: hooks are attributed to it, settings and storage
//! are keyed by its name, and constant changes land in its own delta.

pub mod constants;
pub mod router;
pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use vidhub_core::constants::ConstantFamily;

use crate::constants::ConstantRegistry;
use crate::hooks::definitions::is_server_hook;
use crate::hooks::registry::{HookEntry, HookHandler};
use crate::store::{PluginStore, PluginType};

pub use constants::{ConstantManager, PrivacyManager};
pub use router::PluginRouter;
pub use settings::{
    RegisterSettingOptions, SettingsChangeCallback, SettingsManager, StorageManager,
};

/// Sink receiving validated hook registrations.
pub type HookSink = Arc<dyn Fn(String, HookEntry) -> BoxFuture<'static, ()> + Send + Sync>;

/// A hook registration request.
#[derive(Debug, Clone)]
pub struct RegisterHookOptions {
    /// Hook name.
    pub target: String,
    /// Handler.
    pub handler: HookHandler,
    /// Priority (higher runs first), default 0.
    pub priority: i32,
}

impl RegisterHookOptions {
    /// Creates a registration with priority 0.
    pub fn new(target: &str, handler: HookHandler) -> Self {
        Self {
            target: target.to_string(),
            handler,
            priority: 0,
        }
    }

    /// Sets the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Capability object for one plugin.
#[derive(Clone)]
pub struct RegisterHelpers {
    npm_name: String,
    name: String,
    plugin_type: PluginType,
    data_dir: PathBuf,
    hook_sink: HookSink,
    router: PluginRouter,
    constants: Arc<ConstantRegistry>,
    store: Arc<dyn PluginStore>,
    settings: Arc<RwLock<Vec<RegisterSettingOptions>>>,
    settings_callbacks: Arc<RwLock<Vec<SettingsChangeCallback>>>,
}

impl RegisterHelpers {
    /// Creates the helpers of one plugin.
    pub fn new(
        npm_name: &str,
        data_dir: &Path,
        hook_sink: HookSink,
        constants: Arc<ConstantRegistry>,
        store: Arc<dyn PluginStore>,
    ) -> vidhub_core::AppResult<Self> {
        let (plugin_type, name) = PluginType::from_npm_name(npm_name)?;
        Ok(Self {
            npm_name: npm_name.to_string(),
            name,
            plugin_type,
            data_dir: data_dir.to_path_buf(),
            hook_sink,
            router: PluginRouter::new(),
            constants,
            store,
            settings: Arc::new(RwLock::new(Vec::new())),
            settings_callbacks: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// Namespaced name of the plugin these helpers belong to.
    pub fn npm_name(&self) -> &str {
        &self.npm_name
    }

    /// Registers a hook handler.
    ///
    /// Names outside the server hook catalogue are logged and dropped.
    pub async fn register_hook(&self, options: RegisterHookOptions) {
        if !is_server_hook(&options.target) {
            warn!(
                npm_name = %self.npm_name,
                hook = %options.target,
                "Unknown hook, skipping registration"
            );
            return;
        }

        let entry = HookEntry::new(&self.npm_name, &self.name, options.handler, options.priority);
        (self.hook_sink)(options.target, entry).await;
    }

    /// Declares a setting; declaration order is display order.
    ///
    /// Declaring a name again replaces the earlier declaration.
    pub async fn register_setting(&self, options: RegisterSettingOptions) {
        debug!(npm_name = %self.npm_name, setting = %options.name, "Setting registered");
        let mut settings = self.settings.write().await;
        settings.retain(|s| s.name != options.name);
        settings.push(options);
    }

    /// The plugin's HTTP sub-router.
    pub fn get_router(&self) -> PluginRouter {
        self.router.clone()
    }

    /// Settings accessor.
    pub fn settings_manager(&self) -> SettingsManager {
        SettingsManager {
            name: self.name.clone(),
            plugin_type: self.plugin_type,
            store: self.store.clone(),
            registered: self.settings.clone(),
            callbacks: self.settings_callbacks.clone(),
        }
    }

    /// Storage accessor.
    pub fn storage_manager(&self) -> StorageManager {
        StorageManager {
            name: self.name.clone(),
            plugin_type: self.plugin_type,
            store: self.store.clone(),
        }
    }

    /// Video languages.
    pub fn video_language_manager(&self) -> ConstantManager {
        self.constant_manager(ConstantFamily::Language)
    }

    /// Video categories.
    pub fn video_category_manager(&self) -> ConstantManager {
        self.constant_manager(ConstantFamily::Category)
    }

    /// Video licences.
    pub fn video_licence_manager(&self) -> ConstantManager {
        self.constant_manager(ConstantFamily::Licence)
    }

    /// Video privacies (delete only).
    pub fn video_privacy_manager(&self) -> PrivacyManager {
        PrivacyManager::new(&self.npm_name, ConstantFamily::Privacy, self.constants.clone())
    }

    /// Playlist privacies (delete only).
    pub fn playlist_privacy_manager(&self) -> PrivacyManager {
        PrivacyManager::new(
            &self.npm_name,
            ConstantFamily::PlaylistPrivacy,
            self.constants.clone(),
        )
    }

    /// Directory reserved for the plugin's own files.
    pub fn data_directory_path(&self) -> &Path {
        &self.data_dir
    }

    /// Settings declared so far.
    pub async fn registered_settings(&self) -> Vec<RegisterSettingOptions> {
        self.settings.read().await.clone()
    }

    pub(crate) async fn settings_change_callbacks(&self) -> Vec<SettingsChangeCallback> {
        self.settings_callbacks.read().await.clone()
    }

    fn constant_manager(&self, family: ConstantFamily) -> ConstantManager {
        ConstantManager::new(&self.npm_name, family, self.constants.clone())
    }
}

impl std::fmt::Debug for RegisterHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterHelpers")
            .field("npm_name", &self.npm_name)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}
