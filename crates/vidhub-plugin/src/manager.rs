//! Plugin manager: the lifecycle coordinator.
//!
//! Install, update, uninstall and (un)registration are serialized by one
//! lifecycle lock. Hook dispatch does not take it.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use vidhub_core::config::PluginConfig;
use vidhub_core::{AppError, AppResult};

use crate::constants::ConstantRegistry;
use crate::css::GlobalCss;
use crate::helpers::{HookSink, PluginRouter, RegisterHelpers, RegisterSettingOptions};
use crate::hooks::{HookDispatcher, HookEntry, HookFailure, HookRegistry};
use crate::installer::{
    CommandRunner, DisabledPluginIndex, HttpPluginIndex, PackageInstaller, PluginIndex,
    ProcessRunner,
};
use crate::loader::{ModuleLoader, PluginLibrary, StaticModuleLoader};
use crate::manifest::PackageManifest;
use crate::registry::{PluginRegistry, PluginRuntime, PluginState, RegisteredPlugin};
use crate::store::{MemoryPluginStore, PluginRecord, PluginStore, PluginType};
use crate::template::{NoopTemplateCache, TemplateCache};
use crate::translations::{TranslationStore, load_translation_file};

/// Sub-directory of the extensions directory holding per-plugin data.
const DATA_DIR: &str = "data";

/// Arguments of [`PluginManager::install`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Namespaced name, or a local directory when `from_disk`.
    pub target: String,
    /// Exact version to install.
    pub version: Option<String>,
    /// Install from a local directory.
    pub from_disk: bool,
    /// Register the extension once installed.
    pub register: bool,
}

impl InstallOptions {
    /// Installs `target` from the registry and registers it.
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            version: None,
            from_disk: false,
            register: true,
        }
    }

    /// Pins a version.
    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Treats `target` as a local directory.
    pub fn from_disk(mut self) -> Self {
        self.from_disk = true;
        self
    }

    /// Installs without registering.
    pub fn without_register(mut self) -> Self {
        self.register = false;
        self
    }
}

/// Builds a [`PluginManager`] from configuration plus pluggable seams.
pub struct PluginManagerBuilder {
    config: PluginConfig,
    store: Option<Arc<dyn PluginStore>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    runner: Option<Arc<dyn CommandRunner>>,
    index: Option<Arc<dyn PluginIndex>>,
    templates: Option<Arc<dyn TemplateCache>>,
    constants: Option<Arc<ConstantRegistry>>,
}

impl PluginManagerBuilder {
    /// Starts from a configuration; every seam gets a default.
    pub fn new(config: &PluginConfig) -> Self {
        Self {
            config: config.clone(),
            store: None,
            loader: None,
            runner: None,
            index: None,
            templates: None,
            constants: None,
        }
    }

    /// Plugin metadata store (default: in memory).
    pub fn store(mut self, store: Arc<dyn PluginStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Module loader (default: static, nothing registered).
    pub fn loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Package manager runner (default: child processes).
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Plugin index (default: HTTP when enabled in config).
    pub fn index(mut self, index: Arc<dyn PluginIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Rendered-page cache to invalidate on registry changes.
    pub fn template_cache(mut self, templates: Arc<dyn TemplateCache>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Constant tables shared with the rest of the host.
    pub fn constants(mut self, constants: Arc<ConstantRegistry>) -> Self {
        self.constants = Some(constants);
        self
    }

    /// Builds the manager.
    pub fn build(self) -> AppResult<PluginManager> {
        let index: Arc<dyn PluginIndex> = match self.index {
            Some(index) => index,
            None if self.config.index_enabled => {
                Arc::new(HttpPluginIndex::new(&self.config.index_url)?)
            }
            None => Arc::new(DisabledPluginIndex),
        };
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(ProcessRunner::new()));

        let directory = self.config.directory_path();
        let installer = PackageInstaller::new(
            &directory,
            &self.config.package_manager,
            runner,
            index,
            &self.config.host_version,
        );

        let hooks = Arc::new(HookRegistry::new());
        let dispatcher = Arc::new(HookDispatcher::new(
            hooks.clone(),
            self.config.hook_timeout(),
        ));

        info!(
            directory = %directory.display(),
            hook_timeout_seconds = self.config.hook_timeout_seconds,
            "Plugin manager initialized"
        );

        Ok(PluginManager {
            directory,
            registry: Arc::new(PluginRegistry::new()),
            hooks,
            dispatcher,
            constants: self
                .constants
                .unwrap_or_else(|| Arc::new(ConstantRegistry::with_defaults())),
            translations: TranslationStore::new(),
            css: GlobalCss::new(Path::new(&self.config.global_css_path)),
            installer,
            loader: self
                .loader
                .unwrap_or_else(|| Arc::new(StaticModuleLoader::new())),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryPluginStore::new())),
            templates: self
                .templates
                .unwrap_or_else(|| Arc::new(NoopTemplateCache)),
            lifecycle: Mutex::new(()),
        })
    }
}

/// Owns every registered extension and what it contributed to the host.
#[derive(Debug)]
pub struct PluginManager {
    directory: PathBuf,
    registry: Arc<PluginRegistry>,
    hooks: Arc<HookRegistry>,
    dispatcher: Arc<HookDispatcher>,
    constants: Arc<ConstantRegistry>,
    translations: TranslationStore,
    css: GlobalCss,
    installer: PackageInstaller,
    loader: Arc<dyn ModuleLoader>,
    store: Arc<dyn PluginStore>,
    templates: Arc<dyn TemplateCache>,
    lifecycle: Mutex<()>,
}

impl PluginManager {
    /// Starts a builder.
    pub fn builder(config: &PluginConfig) -> PluginManagerBuilder {
        PluginManagerBuilder::new(config)
    }

    // ── Registration ────────────────────────────────────────────────

    /// Registers every enabled extension from the store.
    ///
    /// A failing extension is logged and skipped; the others still load.
    /// Extensions that are already registered are left alone, so calling
    /// this again only picks up what is new.
    pub async fn register_all_enabled(&self) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;

        // Rebuilt from what is registered now: empty on a fresh host.
        self.regenerate_css().await?;

        let records = self.store.list_enabled().await?;
        info!(count = records.len(), "Registering enabled extensions");

        for record in &records {
            let npm_name = record.npm_name();
            if self.registry.is_registered(&npm_name).await {
                debug!(npm_name = %npm_name, "Extension already registered, skipping");
                continue;
            }
            // A failed registration has already discarded its contributions.
            if let Err(e) = self.register_one_locked(record).await {
                error!(npm_name = %npm_name, error = %e, "Cannot register extension");
            }
        }

        self.hooks.sort_by_priority().await;
        info!(registered = self.registry.count().await, "Extensions registered");
        Ok(())
    }

    /// Registers one installed extension.
    pub async fn register(&self, record: &PluginRecord) -> AppResult<Arc<RegisteredPlugin>> {
        let _guard = self.lifecycle.lock().await;
        let plugin = self.register_one_locked(record).await?;
        self.hooks.sort_by_priority().await;
        Ok(plugin)
    }

    /// Unregisters one extension and rolls back everything it contributed.
    pub async fn unregister(&self, npm_name: &str) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        self.unregister_locked(npm_name).await
    }

    /// Unregisters every extension, most recent first.
    pub async fn unregister_all(&self) {
        let _guard = self.lifecycle.lock().await;
        let mut plugins = self.registry.list().await;
        plugins.reverse();

        for plugin in plugins {
            if let Err(e) = self.unregister_locked(&plugin.npm_name).await {
                warn!(npm_name = %plugin.npm_name, error = %e, "Cannot unregister extension");
            }
        }
    }

    async fn register_one_locked(&self, record: &PluginRecord) -> AppResult<Arc<RegisteredPlugin>> {
        let npm_name = record.npm_name();
        if self.registry.is_registered(&npm_name).await {
            return Err(AppError::conflict(format!(
                "'{npm_name}' is already registered"
            )));
        }

        info!(npm_name = %npm_name, "Registering extension");
        self.registry.set_state(&npm_name, PluginState::Loading).await;

        match self.load_and_register(record, &npm_name).await {
            Ok(plugin) => {
                self.templates.invalidate();
                Ok(plugin)
            }
            Err(e) => {
                self.discard_contributions(&npm_name).await;
                self.registry.set_state(&npm_name, PluginState::Unloaded).await;
                Err(e)
            }
        }
    }

    async fn load_and_register(
        &self,
        record: &PluginRecord,
        npm_name: &str,
    ) -> AppResult<Arc<RegisteredPlugin>> {
        let path = self.installer.package_path(npm_name);
        let manifest = PackageManifest::read(&path).await?;
        manifest.validate(record.plugin_type)?;

        let runtime = match record.plugin_type {
            PluginType::Plugin => Some(self.run_plugin_code(npm_name, &path, &manifest).await?),
            PluginType::Theme => None,
        };

        if let Err(e) = self.add_assets(npm_name, &path, &manifest, record.plugin_type).await {
            if let Some(runtime) = &runtime {
                call_unregister(npm_name, &runtime.library).await;
            }
            return Err(e);
        }

        self.registry
            .insert(RegisteredPlugin {
                npm_name: npm_name.to_string(),
                name: record.name.clone(),
                plugin_type: record.plugin_type,
                version: manifest.version.clone(),
                description: manifest.description.clone().unwrap_or_default(),
                engine_version: manifest.engine_version().to_string(),
                path,
                static_dirs: manifest.static_dirs.clone(),
                client_scripts: manifest
                    .client_scripts
                    .iter()
                    .map(|s| (s.script.clone(), s.clone()))
                    .collect(),
                css: manifest.css.clone(),
                runtime,
            })
            .await
    }

    async fn run_plugin_code(
        &self,
        npm_name: &str,
        path: &Path,
        manifest: &PackageManifest,
    ) -> AppResult<PluginRuntime> {
        let library_path = path.join(manifest.library.as_deref().unwrap_or_default());

        self.loader.invalidate(&library_path).await;
        let library = self
            .loader
            .load(npm_name, &library_path)
            .await?
            .into_library(npm_name)?;

        let data_dir = self.directory.join(DATA_DIR).join(npm_name);
        tokio::fs::create_dir_all(&data_dir).await?;

        let helpers = RegisterHelpers::new(
            npm_name,
            &data_dir,
            self.hook_sink(),
            self.constants.clone(),
            self.store.clone(),
        )?;

        let register = library.register.clone();
        let entry = helpers.clone();
        guarded(npm_name, "register", move || register(entry)).await?;

        debug!(npm_name = %npm_name, "Extension code registered");
        Ok(PluginRuntime { helpers, library })
    }

    async fn add_assets(
        &self,
        npm_name: &str,
        path: &Path,
        manifest: &PackageManifest,
        plugin_type: PluginType,
    ) -> AppResult<()> {
        if plugin_type == PluginType::Plugin {
            self.css.append(path, &manifest.css).await?;
        }

        for (locale, file) in &manifest.translations {
            let table = load_translation_file(&path.join(file)).await?;
            self.translations.add(npm_name, locale, table).await;
        }
        Ok(())
    }

    async fn unregister_locked(&self, npm_name: &str) -> AppResult<()> {
        let plugin = self.registry.remove(npm_name).await.ok_or_else(|| {
            AppError::not_found(format!("Unknown extension '{npm_name}' to unregister"))
        })?;

        info!(npm_name = %npm_name, "Unregistering extension");
        self.registry.set_state(npm_name, PluginState::Unloading).await;

        self.translations.remove(npm_name).await;

        if plugin.plugin_type == PluginType::Plugin {
            if let Some(runtime) = &plugin.runtime {
                call_unregister(npm_name, &runtime.library).await;
            }
            self.hooks.unregister_plugin(npm_name).await;
            self.constants.revert_all(npm_name).await;

            info!("Regenerating global CSS of registered plugins");
            self.regenerate_css().await?;
        }

        self.registry.set_state(npm_name, PluginState::Unloaded).await;
        self.templates.invalidate();
        Ok(())
    }

    /// Drops whatever a half-registered extension left behind.
    async fn discard_contributions(&self, npm_name: &str) {
        let removed = self.hooks.unregister_plugin(npm_name).await;
        self.constants.revert_all(npm_name).await;
        self.translations.remove(npm_name).await;

        if let Err(e) = self.regenerate_css().await {
            warn!(npm_name = %npm_name, error = %e, "Cannot regenerate global CSS");
        }
        debug!(npm_name = %npm_name, hooks = removed, "Discarded partial registration");
    }

    async fn regenerate_css(&self) -> AppResult<()> {
        let packages: Vec<(PathBuf, Vec<String>)> = self
            .registry
            .list_by_type(PluginType::Plugin)
            .await
            .iter()
            .map(|p| (p.path.clone(), p.css.clone()))
            .collect();
        self.css.regenerate(&packages).await
    }

    fn hook_sink(&self) -> HookSink {
        let hooks = self.hooks.clone();
        Arc::new(move |hook: String, entry: HookEntry| {
            let hooks = hooks.clone();
            async move { hooks.add(&hook, entry).await }.boxed()
        })
    }

    // ── Package lifecycle ───────────────────────────────────────────

    /// Installs an extension package and (optionally) registers it.
    ///
    /// Any failure after the package reached the disk uninstalls it again;
    /// the original error is returned.
    pub async fn install(&self, options: InstallOptions) -> AppResult<PluginRecord> {
        let _guard = self.lifecycle.lock().await;
        self.install_locked(options).await
    }

    async fn install_locked(&self, options: InstallOptions) -> AppResult<PluginRecord> {
        let target_name = target_npm_name(&options.target, options.from_disk);
        if self.registry.is_registered(&target_name).await {
            return Err(AppError::conflict(format!(
                "'{target_name}' is registered; update it instead"
            )));
        }

        let installed = self
            .installer
            .install(&options.target, options.version.as_deref(), options.from_disk)
            .await?;
        let npm_name = installed.npm_name.clone();

        let result = async {
            let (plugin_type, name) = PluginType::from_npm_name(&npm_name)?;
            let manifest = PackageManifest::read(&installed.path).await?;
            manifest.validate(plugin_type)?;

            let mut record = PluginRecord::new(&name, plugin_type, &manifest.version);
            record.description = manifest.description.clone().unwrap_or_default();
            record.homepage = manifest.homepage.clone().unwrap_or_default();
            record.engine_version = manifest.engine_version().to_string();
            let record = self.store.upsert(record).await?;

            info!(npm_name = %npm_name, version = %record.version, "Extension installed");

            if options.register {
                self.register_one_locked(&record).await?;
                self.hooks.sort_by_priority().await;
            }
            Ok(record)
        }
        .await;

        if let Err(e) = &result {
            error!(npm_name = %npm_name, error = %e, "Cannot install extension, removing it");
            self.rollback_install(&npm_name).await;
        }
        result
    }

    async fn rollback_install(&self, npm_name: &str) {
        match self.uninstall_locked(npm_name, true).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => warn!(npm_name = %npm_name, error = %e, "Cannot uninstall after failure"),
        }
        if let Err(e) = self.installer.remove(npm_name).await {
            warn!(npm_name = %npm_name, error = %e, "Cannot remove extension package");
        }
    }

    /// Reinstalls an extension, by default at the latest compatible version
    /// recorded for it.
    ///
    /// On failure the extension is left unregistered, its record disabled
    /// and marked uninstalled, and its package removed.
    pub async fn update(
        &self,
        target: &str,
        version: Option<&str>,
        from_disk: bool,
    ) -> AppResult<PluginRecord> {
        let _guard = self.lifecycle.lock().await;
        let npm_name = target_npm_name(target, from_disk);
        info!(npm_name = %npm_name, "Updating extension");

        let version = match version {
            Some(v) => Some(v.to_string()),
            None if !from_disk => self
                .store
                .load_by_npm_name(&npm_name)
                .await?
                .ok_or_else(|| AppError::not_found(format!("'{npm_name}' is not installed")))?
                .latest_version,
            None => None,
        };

        // A rejected target must leave the running extension untouched.
        PackageInstaller::check_target(target, version.as_deref(), from_disk)?;

        if let Err(e) = self.unregister_locked(&npm_name).await {
            warn!(npm_name = %npm_name, error = %e, "Cannot unregister extension before update");
        }

        let options = InstallOptions {
            target: target.to_string(),
            version,
            from_disk,
            register: true,
        };
        let result = self.install_locked(options).await;
        if result.is_err() {
            self.mark_uninstalled(&npm_name).await;
            if tokio::fs::try_exists(self.installer.package_path(&npm_name))
                .await
                .unwrap_or(true)
                && let Err(e) = self.installer.remove(&npm_name).await
            {
                warn!(npm_name = %npm_name, error = %e, "Cannot remove package after failed update");
            }
        }
        result
    }

    /// Uninstalls an extension. A missing or already uninstalled extension
    /// is a no-op.
    pub async fn uninstall(&self, npm_name: &str, unregister: bool) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        self.uninstall_locked(npm_name, unregister).await.map(|_| ())
    }

    /// Returns whether anything was uninstalled.
    async fn uninstall_locked(&self, npm_name: &str, unregister: bool) -> AppResult<bool> {
        let mut record = match self.store.load_by_npm_name(npm_name).await? {
            Some(record) if !record.uninstalled => record,
            _ => {
                info!(npm_name = %npm_name, "Extension is not installed, nothing to uninstall");
                return Ok(false);
            }
        };

        info!(npm_name = %npm_name, "Uninstalling extension");

        if unregister && let Err(e) = self.unregister_locked(npm_name).await {
            warn!(npm_name = %npm_name, error = %e, "Cannot unregister extension");
        }

        record.enabled = false;
        record.uninstalled = true;
        self.store.save(record).await?;

        self.installer.remove(npm_name).await?;
        Ok(true)
    }

    async fn mark_uninstalled(&self, npm_name: &str) {
        let mut record = match self.store.load_by_npm_name(npm_name).await {
            Ok(Some(record)) if record.enabled || !record.uninstalled => record,
            _ => return,
        };

        record.enabled = false;
        record.uninstalled = true;
        if let Err(e) = self.store.save(record).await {
            warn!(npm_name = %npm_name, error = %e, "Cannot mark extension uninstalled");
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Whether an extension is registered.
    pub async fn is_registered(&self, npm_name: &str) -> bool {
        self.registry.is_registered(npm_name).await
    }

    /// Lifecycle state of an extension.
    pub async fn state(&self, npm_name: &str) -> PluginState {
        self.registry.state(npm_name).await
    }

    /// A registered plugin or theme by namespaced name.
    pub async fn get_registered_plugin_or_theme(
        &self,
        npm_name: &str,
    ) -> Option<Arc<RegisteredPlugin>> {
        self.registry.get(npm_name).await
    }

    /// A registered plugin by short name.
    pub async fn get_registered_plugin_by_short_name(
        &self,
        name: &str,
    ) -> Option<Arc<RegisteredPlugin>> {
        self.registry
            .find_by_short_name(name, PluginType::Plugin)
            .await
    }

    /// A registered theme by short name.
    pub async fn get_registered_theme_by_short_name(
        &self,
        name: &str,
    ) -> Option<Arc<RegisteredPlugin>> {
        self.registry
            .find_by_short_name(name, PluginType::Theme)
            .await
    }

    /// Registered plugins, in registration order.
    pub async fn get_registered_plugins(&self) -> Vec<Arc<RegisteredPlugin>> {
        self.registry.list_by_type(PluginType::Plugin).await
    }

    /// Registered themes, in registration order.
    pub async fn get_registered_themes(&self) -> Vec<Arc<RegisteredPlugin>> {
        self.registry.list_by_type(PluginType::Theme).await
    }

    /// Settings a plugin declared; empty for themes and unknown names.
    pub async fn get_registered_settings(&self, npm_name: &str) -> Vec<RegisterSettingOptions> {
        match self.runtime_of(npm_name).await {
            Some(runtime) => runtime.helpers.registered_settings().await,
            None => Vec::new(),
        }
    }

    /// HTTP sub-router of a registered plugin.
    pub async fn get_router(&self, npm_name: &str) -> Option<PluginRouter> {
        self.runtime_of(npm_name)
            .await
            .map(|runtime| runtime.helpers.get_router())
    }

    /// Translations of every extension for a locale.
    pub async fn get_translations(&self, locale: &str) -> HashMap<String, Map<String, Value>> {
        self.translations.get(locale).await
    }

    /// Content of the aggregated CSS file.
    pub async fn global_css(&self) -> AppResult<String> {
        self.css.read().await
    }

    /// Shared constant tables.
    pub fn constants(&self) -> &Arc<ConstantRegistry> {
        &self.constants
    }

    /// Plugin metadata store.
    pub fn store(&self) -> &Arc<dyn PluginStore> {
        &self.store
    }

    /// Hook registry.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    async fn runtime_of(&self, npm_name: &str) -> Option<PluginRuntime> {
        self.registry
            .get(npm_name)
            .await
            .and_then(|plugin| plugin.runtime.clone())
    }

    // ── Hooks and notifications ─────────────────────────────────────

    /// Runs a hook. See [`HookDispatcher::run`].
    pub async fn run_hook(&self, hook_name: &str, result: Value, params: Value) -> Value {
        self.dispatcher.run(hook_name, result, params).await
    }

    /// Receives every hook handler failure.
    pub fn subscribe_hook_failures(&self) -> broadcast::Receiver<HookFailure> {
        self.dispatcher.subscribe_failures()
    }

    /// Tells a plugin (by short name) that its settings changed.
    ///
    /// Callback failures are logged; the remaining callbacks still run.
    pub async fn on_settings_changed(
        &self,
        name: &str,
        settings: Map<String, Value>,
    ) -> AppResult<()> {
        let plugin = self
            .get_registered_plugin_by_short_name(name)
            .await
            .ok_or_else(|| AppError::not_found(format!("Unknown plugin '{name}'")))?;

        let Some(runtime) = &plugin.runtime else {
            return Ok(());
        };

        for callback in runtime.helpers.settings_change_callbacks().await {
            let settings = settings.clone();
            let call = move || callback(settings);
            if let Err(e) = guarded(&plugin.npm_name, "settings change", call).await {
                error!(npm_name = %plugin.npm_name, error = %e, "Settings change callback failed");
            }
        }
        Ok(())
    }
}

/// Namespaced name an install target refers to.
fn target_npm_name(target: &str, from_disk: bool) -> String {
    if !from_disk {
        return target.to_string();
    }
    Path::new(target)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Runs plugin code, turning errors and panics into `PluginHandler` errors.
async fn guarded<F>(npm_name: &str, what: &str, call: F) -> AppResult<()>
where
    F: FnOnce() -> BoxFuture<'static, anyhow::Result<()>>,
{
    let panicked = || AppError::plugin_handler(format!("{what} of '{npm_name}' panicked"));

    let future = std::panic::catch_unwind(AssertUnwindSafe(call)).map_err(|_| panicked())?;
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::plugin_handler(format!(
            "{what} of '{npm_name}' failed: {e:#}"
        ))),
        Err(_) => Err(panicked()),
    }
}

async fn call_unregister(npm_name: &str, library: &PluginLibrary) {
    let unregister = library.unregister.clone();
    if let Err(e) = guarded(npm_name, "unregister", move || unregister()).await {
        error!(npm_name = %npm_name, error = %e, "Extension unregister failed");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::helpers::RegisterHookOptions;
    use crate::hooks::HookHandler;
    use crate::traits::ServerPlugin;
    use vidhub_core::constants::{ConstantFamily, ConstantKey};

    struct Tagger {
        tag: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl ServerPlugin for Tagger {
        async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
            let tag = self.tag;
            helpers
                .register_hook(RegisterHookOptions::new(
                    "filter:api.video.get.result",
                    HookHandler::sync(move |mut value, _| {
                        if let Some(tags) = value.as_array_mut() {
                            tags.push(json!(tag));
                        }
                        Ok(value)
                    }),
                ))
                .await;
            helpers
                .video_language_manager()
                .add_constant(ConstantKey::from(tag), tag)
                .await;

            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn write_package(dir: &Path, npm_name: &str) {
        let package = dir.join("node_modules").join(npm_name);
        std::fs::create_dir_all(&package).unwrap();
        let manifest = json!({
            "name": npm_name,
            "version": "1.0.0",
            "description": "Test extension",
            "engine": { "vidhub": ">=0.1.0" },
            "homepage": "https://example.com",
            "author": "Tests",
            "bugs": "https://example.com/issues",
            "library": "lib.so"
        });
        std::fs::write(package.join("package.json"), manifest.to_string()).unwrap();
    }

    async fn setup(plugins: &[(&str, Tagger)]) -> (tempfile::TempDir, PluginManager) {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(StaticModuleLoader::new());
        let mut records = Vec::new();

        for (name, plugin) in plugins {
            let npm_name = PluginType::Plugin.build_npm_name(name);
            write_package(dir.path(), &npm_name);
            loader
                .register_plugin(
                    &npm_name,
                    Arc::new(Tagger {
                        tag: plugin.tag,
                        fail: plugin.fail,
                    }),
                )
                .await;
            records.push(PluginRecord::new(name, PluginType::Plugin, "1.0.0"));
        }

        let config = PluginConfig {
            directory: dir.path().to_string_lossy().to_string(),
            global_css_path: dir.path().join("global.css").to_string_lossy().to_string(),
            index_enabled: false,
            ..PluginConfig::default()
        };
        let manager = PluginManager::builder(&config)
            .store(Arc::new(MemoryPluginStore::with_records(records)))
            .loader(loader)
            .build()
            .unwrap();
        (dir, manager)
    }

    #[tokio::test]
    async fn test_failing_plugin_is_isolated() {
        let (_dir, manager) = setup(&[
            ("good", Tagger { tag: "good", fail: false }),
            ("bad", Tagger { tag: "bad", fail: true }),
        ])
        .await;

        manager.register_all_enabled().await.unwrap();

        assert!(manager.is_registered("vidhub-plugin-good").await);
        assert!(!manager.is_registered("vidhub-plugin-bad").await);
        assert_eq!(manager.state("vidhub-plugin-bad").await, PluginState::Unloaded);

        let result = manager
            .run_hook("filter:api.video.get.result", json!([]), Value::Null)
            .await;
        assert_eq!(result, json!(["good"]));

        let languages = manager.constants().table(ConstantFamily::Language).await;
        assert!(languages.contains_key(&ConstantKey::from("good")));
        assert!(!languages.contains_key(&ConstantKey::from("bad")));
    }

    #[tokio::test]
    async fn test_unregister_rolls_back_contributions() {
        let (_dir, manager) = setup(&[("good", Tagger { tag: "good", fail: false })]).await;
        manager.register_all_enabled().await.unwrap();

        manager.unregister("vidhub-plugin-good").await.unwrap();

        assert!(!manager.is_registered("vidhub-plugin-good").await);
        assert_eq!(manager.hooks().handler_count("filter:api.video.get.result").await, 0);
        let languages = manager.constants().table(ConstantFamily::Language).await;
        assert!(!languages.contains_key(&ConstantKey::from("good")));

        let err = manager.unregister("vidhub-plugin-good").await.unwrap_err();
        assert!(err.is(vidhub_core::error::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_uninstall_unknown_is_noop() {
        let (_dir, manager) = setup(&[]).await;
        manager.uninstall("vidhub-plugin-nope", true).await.unwrap();
    }

    #[test]
    fn test_target_npm_name() {
        assert_eq!(target_npm_name("vidhub-plugin-a", false), "vidhub-plugin-a");
        assert_eq!(
            target_npm_name("/src/vidhub-theme-dark", true),
            "vidhub-theme-dark"
        );
    }
}
