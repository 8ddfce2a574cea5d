//! Plugin entry-module loading.
//!
//! A loaded module exposes a `register` and an `unregister` entry point.
//! Loaders cache modules by library path; [`ModuleLoader::invalidate`] drops
//! the cache entry so the next load picks up new code at the same path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::debug;

use vidhub_core::{AppError, AppResult};

use crate::helpers::RegisterHelpers;
use crate::traits::ServerPlugin;

/// `register` entry point.
pub type RegisterEntry =
    Arc<dyn Fn(RegisterHelpers) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// `unregister` entry point.
pub type UnregisterEntry = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a module exports; either entry point may be missing.
#[derive(Clone, Default)]
pub struct PluginModule {
    /// `register` export.
    pub register: Option<RegisterEntry>,
    /// `unregister` export.
    pub unregister: Option<UnregisterEntry>,
}

impl PluginModule {
    /// Wraps a [`ServerPlugin`] implementation.
    pub fn from_plugin(plugin: Arc<dyn ServerPlugin>) -> Self {
        let on_register = plugin.clone();
        let register: RegisterEntry = Arc::new(move |helpers: RegisterHelpers| {
            let plugin = on_register.clone();
            async move { plugin.register(helpers).await }.boxed()
        });

        let unregister: UnregisterEntry = Arc::new(move || {
            let plugin = plugin.clone();
            async move { plugin.unregister().await }.boxed()
        });

        Self {
            register: Some(register),
            unregister: Some(unregister),
        }
    }

    /// Checks that both entry points exist.
    pub fn into_library(self, npm_name: &str) -> AppResult<PluginLibrary> {
        match (self.register, self.unregister) {
            (Some(register), Some(unregister)) => Ok(PluginLibrary {
                register,
                unregister,
            }),
            (register, _) => {
                let missing = if register.is_none() {
                    "register"
                } else {
                    "unregister"
                };
                Err(AppError::plugin_load(format!(
                    "Plugin '{npm_name}' does not export a '{missing}' function"
                )))
            }
        }
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginModule")
            .field("register", &self.register.is_some())
            .field("unregister", &self.unregister.is_some())
            .finish()
    }
}

/// A module with both entry points.
#[derive(Clone)]
pub struct PluginLibrary {
    /// `register` entry point.
    pub register: RegisterEntry,
    /// `unregister` entry point.
    pub unregister: UnregisterEntry,
}

impl std::fmt::Debug for PluginLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLibrary").finish_non_exhaustive()
    }
}

/// Loads plugin entry modules.
#[async_trait]
pub trait ModuleLoader: Send + Sync + std::fmt::Debug + 'static {
    /// Loads (or returns the cached) module of `npm_name` at `library_path`.
    async fn load(&self, npm_name: &str, library_path: &Path) -> AppResult<PluginModule>;

    /// Forgets the cached module at `library_path`.
    async fn invalidate(&self, library_path: &Path);
}

/// Factory producing a module.
pub type ModuleFactory = Arc<dyn Fn() -> PluginModule + Send + Sync>;

/// Loader for plugins compiled into the host, keyed by namespaced name.
#[derive(Default)]
pub struct StaticModuleLoader {
    factories: RwLock<HashMap<String, ModuleFactory>>,
    cache: RwLock<HashMap<PathBuf, PluginModule>>,
    loads: RwLock<HashMap<String, usize>>,
}

impl StaticModuleLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `npm_name`.
    pub async fn register_factory(&self, npm_name: &str, factory: ModuleFactory) {
        self.factories
            .write()
            .await
            .insert(npm_name.to_string(), factory);
    }

    /// Registers a plugin implementation for `npm_name`.
    pub async fn register_plugin(&self, npm_name: &str, plugin: Arc<dyn ServerPlugin>) {
        let factory: ModuleFactory = Arc::new(move || PluginModule::from_plugin(plugin.clone()));
        self.register_factory(npm_name, factory).await;
    }

    /// How many times the module of `npm_name` was actually built.
    pub async fn load_count(&self, npm_name: &str) -> usize {
        self.loads.read().await.get(npm_name).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for StaticModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticModuleLoader").finish_non_exhaustive()
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(&self, npm_name: &str, library_path: &Path) -> AppResult<PluginModule> {
        if let Some(module) = self.cache.read().await.get(library_path) {
            return Ok(module.clone());
        }

        let factory = self
            .factories
            .read()
            .await
            .get(npm_name)
            .cloned()
            .ok_or_else(|| {
                AppError::plugin_load(format!(
                    "Cannot find module '{}' for '{npm_name}'",
                    library_path.display()
                ))
            })?;

        let module = factory();
        *self.loads.write().await.entry(npm_name.to_string()).or_default() += 1;
        self.cache
            .write()
            .await
            .insert(library_path.to_path_buf(), module.clone());

        debug!(npm_name = %npm_name, path = %library_path.display(), "Static module loaded");
        Ok(module)
    }

    async fn invalidate(&self, library_path: &Path) {
        self.cache.write().await.remove(library_path);
    }
}

/// Shared-library loader using `libloading` (feature-gated).
#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use super::*;

    use crate::ffi::abi::{
        ABI_VERSION, ABI_VERSION_SYMBOL, AbiVersionFn, REGISTER_SYMBOL, RegisterFn,
        UNREGISTER_SYMBOL, UnregisterFn,
    };

    #[derive(Default)]
    struct LoadedLibraries {
        cache: HashMap<PathBuf, PluginModule>,
        /// Never unloaded: futures and closures handed out may still point
        /// into any library that was ever loaded.
        libraries: Vec<libloading::Library>,
    }

    /// Loads plugins from `.so` / `.dylib` / `.dll` files.
    ///
    /// Each load copies the library to a fresh path under `shadow_dir` first,
    /// since the platform loader would otherwise hand back the already-mapped
    /// image for a path it has seen.
    pub struct DynamicModuleLoader {
        shadow_dir: PathBuf,
        state: tokio::sync::Mutex<LoadedLibraries>,
    }

    impl DynamicModuleLoader {
        /// Creates a loader copying libraries into `shadow_dir`.
        pub fn new(shadow_dir: &Path) -> Self {
            Self {
                shadow_dir: shadow_dir.to_path_buf(),
                state: tokio::sync::Mutex::new(LoadedLibraries::default()),
            }
        }

        async fn shadow_copy(&self, library_path: &Path) -> AppResult<PathBuf> {
            tokio::fs::create_dir_all(&self.shadow_dir).await?;

            let file_name = library_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "plugin".to_string());
            let shadow = self
                .shadow_dir
                .join(format!("{}-{file_name}", uuid::Uuid::new_v4()));

            tokio::fs::copy(library_path, &shadow).await.map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::PluginLoad,
                    format!("Cannot find module '{}'", library_path.display()),
                    e,
                )
            })?;
            Ok(shadow)
        }
    }

    impl std::fmt::Debug for DynamicModuleLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicModuleLoader")
                .field("shadow_dir", &self.shadow_dir)
                .finish_non_exhaustive()
        }
    }

    #[async_trait]
    impl ModuleLoader for DynamicModuleLoader {
        async fn load(&self, npm_name: &str, library_path: &Path) -> AppResult<PluginModule> {
            let mut state = self.state.lock().await;
            if let Some(module) = state.cache.get(library_path) {
                return Ok(module.clone());
            }

            let shadow = self.shadow_copy(library_path).await?;

            // SAFETY: loading runs the library's initialisers with full host
            // privileges. Only trusted packages reach this point.
            let library = unsafe { libloading::Library::new(&shadow) }.map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::PluginLoad,
                    format!("Failed to load plugin library '{}'", library_path.display()),
                    e,
                )
            })?;

            // SAFETY: the symbol types match the definitions in `ffi::abi`,
            // which the export macro implements.
            let abi = unsafe { library.get::<AbiVersionFn>(ABI_VERSION_SYMBOL) }
                .map(|f| (*f)())
                .map_err(|e| {
                    AppError::with_source(
                        vidhub_core::error::ErrorKind::PluginLoad,
                        format!("Plugin '{npm_name}' has no ABI version symbol"),
                        e,
                    )
                })?;
            if abi != ABI_VERSION {
                return Err(AppError::plugin_load(format!(
                    "Plugin '{npm_name}' was built for ABI {abi}, host speaks {ABI_VERSION}"
                )));
            }

            // SAFETY: as above.
            let register = unsafe { library.get::<RegisterFn>(REGISTER_SYMBOL) }
                .ok()
                .map(|f| *f);
            // SAFETY: as above.
            let unregister = unsafe { library.get::<UnregisterFn>(UNREGISTER_SYMBOL) }
                .ok()
                .map(|f| *f);

            let module = PluginModule {
                register: register.map(|f| -> RegisterEntry { Arc::new(move |helpers| f(helpers)) }),
                unregister: unregister.map(|f| -> UnregisterEntry { Arc::new(move || f()) }),
            };

            tracing::info!(
                npm_name = %npm_name,
                path = %library_path.display(),
                shadow = %shadow.display(),
                "Dynamic plugin library loaded"
            );

            state.libraries.push(library);
            state
                .cache
                .insert(library_path.to_path_buf(), module.clone());
            Ok(module)
        }

        async fn invalidate(&self, library_path: &Path) {
            self.state.lock().await.cache.remove(library_path);
        }
    }

}

#[cfg(feature = "dynamic")]
pub use dynamic_loader::DynamicModuleLoader;
