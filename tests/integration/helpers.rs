//! Shared test helpers for integration tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use vidhub_core::config::PluginConfig;
use vidhub_core::{AppError, AppResult};
use vidhub_plugin::installer::{CommandRunner, DisabledPluginIndex, PackageCommand, PACKAGES_DIR};
use vidhub_plugin::{
    MemoryPluginStore, PluginManager, PluginRecord, PluginStore, PluginType, ServerPlugin,
    StaticModuleLoader,
};
use vidhub_plugin_sdk::prelude::*;

/// A package the fake registry can serve: manifest plus extra files.
#[derive(Debug, Clone)]
pub struct Package {
    pub manifest: Value,
    pub files: Vec<(String, String)>,
}

impl Package {
    /// A valid package of the given kind.
    pub fn new(npm_name: &str, version: &str) -> Self {
        let mut manifest = json!({
            "name": npm_name,
            "version": version,
            "description": "Integration test extension",
            "engine": { "vidhub": ">=0.1.0" },
            "homepage": "https://example.com",
            "author": "Tests",
            "bugs": "https://example.com/issues"
        });
        if npm_name.starts_with("vidhub-plugin-") {
            manifest["library"] = json!("lib.so");
        }
        Self {
            manifest,
            files: Vec::new(),
        }
    }

    /// Adds a CSS file to the manifest.
    pub fn css(mut self, file: &str, content: &str) -> Self {
        push(&mut self.manifest, "css", json!(file));
        self.files.push((file.to_string(), content.to_string()));
        self
    }

    /// Adds a translation file to the manifest.
    pub fn translation(mut self, locale: &str, file: &str, table: Value) -> Self {
        self.manifest["translations"][locale] = json!(file);
        self.files.push((file.to_string(), table.to_string()));
        self
    }

    /// Adds a static directory holding one file.
    pub fn static_file(mut self, alias: &str, dir: &str, file: &str, content: &str) -> Self {
        self.manifest["staticDirs"][alias] = json!(dir);
        self.files
            .push((format!("{dir}/{file}"), content.to_string()));
        self
    }

    /// Removes a manifest field.
    pub fn without(mut self, field: &str) -> Self {
        if let Some(map) = self.manifest.as_object_mut() {
            map.remove(field);
        }
        self
    }

    /// Writes the package to `dir`.
    pub fn write_to(&self, dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("package.json"), self.manifest.to_string()).unwrap();
        for (file, content) in &self.files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }
}

fn push(manifest: &mut Value, field: &str, value: Value) {
    match manifest.get_mut(field).and_then(Value::as_array_mut) {
        Some(list) => list.push(value),
        None => manifest[field] = json!([value]),
    }
}

/// Package manager stand-in: records every command and materialises
/// published packages on `add`.
#[derive(Debug, Default)]
pub struct FakeRunner {
    registry: Mutex<HashMap<String, Package>>,
    calls: Mutex<Vec<Vec<String>>>,
    fail_add: AtomicBool,
}

impl FakeRunner {
    /// Makes a package installable by name.
    pub fn publish(&self, package: Package) {
        let name = package.manifest["name"].as_str().unwrap().to_string();
        self.registry.lock().unwrap().insert(name, package);
    }

    /// Arguments of every command run so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes every subsequent `add` fail.
    pub fn fail_adds(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    fn add(&self, spec: &str, modules: &Path) -> AppResult<()> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(AppError::installation("registry unreachable"));
        }

        if let Some(source) = spec.strip_prefix("file:") {
            let source = Path::new(source);
            let name = source.file_name().unwrap();
            copy_dir(source, &modules.join(name))?;
            return Ok(());
        }

        let name = spec.split('@').next().unwrap_or(spec);
        let package = self
            .registry
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::installation(format!("{name} not found in registry")))?;
        package.write_to(&modules.join(name));
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &PackageCommand) -> AppResult<()> {
        self.calls.lock().unwrap().push(command.args.clone());
        let modules = command.cwd.join(PACKAGES_DIR);

        match command.args.first().map(String::as_str) {
            Some("add") => self.add(&command.args[1], &modules),
            Some("remove") => match std::fs::remove_dir_all(modules.join(&command.args[1])) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

fn copy_dir(from: &Path, to: &Path) -> AppResult<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// A plugin host over a temporary extensions directory.
pub struct TestHost {
    pub dir: TempDir,
    pub manager: Arc<PluginManager>,
    pub store: Arc<MemoryPluginStore>,
    pub loader: Arc<StaticModuleLoader>,
    pub runner: Arc<FakeRunner>,
}

impl TestHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryPluginStore::new());
        let loader = Arc::new(StaticModuleLoader::new());
        let runner = Arc::new(FakeRunner::default());

        let config = PluginConfig {
            directory: dir.path().join("plugins").to_string_lossy().to_string(),
            global_css_path: dir.path().join("global.css").to_string_lossy().to_string(),
            index_enabled: false,
            hook_timeout_seconds: 5,
            ..PluginConfig::default()
        };

        let manager = PluginManager::builder(&config)
            .store(store.clone())
            .loader(loader.clone())
            .runner(runner.clone())
            .index(Arc::new(DisabledPluginIndex))
            .build()
            .unwrap();

        Self {
            dir,
            manager: Arc::new(manager),
            store,
            loader,
            runner,
        }
    }

    /// Where a package is installed.
    pub fn package_dir(&self, npm_name: &str) -> PathBuf {
        self.dir
            .path()
            .join("plugins")
            .join(PACKAGES_DIR)
            .join(npm_name)
    }

    /// Makes the server code of a plugin loadable.
    pub async fn provide(&self, npm_name: &str, plugin: impl ServerPlugin) {
        self.loader.register_plugin(npm_name, Arc::new(plugin)).await;
    }

    /// Puts an installed, enabled extension on disk and in the store.
    pub async fn seed(&self, package: Package) -> PluginRecord {
        let npm_name = package.manifest["name"].as_str().unwrap().to_string();
        package.write_to(&self.package_dir(&npm_name));

        let (plugin_type, name) = PluginType::from_npm_name(&npm_name).unwrap();
        let version = package.manifest["version"].as_str().unwrap();
        self.store
            .upsert(PluginRecord::new(&name, plugin_type, version))
            .await
            .unwrap()
    }

    /// Seeds a plugin and its code in one go.
    pub async fn seed_plugin(&self, name: &str, plugin: impl ServerPlugin) -> PluginRecord {
        let npm_name = PluginType::Plugin.build_npm_name(name);
        self.provide(&npm_name, plugin).await;
        self.seed(Package::new(&npm_name, "1.0.0")).await
    }
}

// ── Test plugins ────────────────────────────────────────────────────

/// Appends `tag` to the array flowing through a filter hook.
pub struct Tagger {
    pub hook: &'static str,
    pub tag: &'static str,
    pub priority: i32,
}

impl Tagger {
    pub fn new(tag: &'static str, priority: i32) -> Self {
        Self {
            hook: "filter:api.video.get.result",
            tag,
            priority,
        }
    }
}

#[async_trait]
impl ServerPlugin for Tagger {
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
        let tag = self.tag;
        let handler = HookHandler::sync(move |mut value, _| {
            if let Some(list) = value.as_array_mut() {
                list.push(json!(tag));
            }
            Ok(value)
        });
        helpers
            .register_hook(RegisterHookOptions::new(self.hook, handler).priority(self.priority))
            .await;
        Ok(())
    }
}

/// Edits the language vocabulary, then optionally fails.
#[derive(Default)]
pub struct LanguageEditor {
    pub add: Vec<(&'static str, &'static str)>,
    pub delete: Vec<&'static str>,
    pub fail: bool,
}

#[async_trait]
impl ServerPlugin for LanguageEditor {
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
        let languages = helpers.video_language_manager();
        for (key, label) in &self.add {
            languages.add_constant(*key, label).await;
        }
        for key in &self.delete {
            languages.delete_constant(*key).await;
        }
        if self.fail {
            anyhow::bail!("register failed on purpose");
        }
        Ok(())
    }
}

/// Serves `GET /ping` on its sub-router.
pub struct Pinger;

#[async_trait]
impl ServerPlugin for Pinger {
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
        helpers
            .get_router()
            .route("/ping", axum::routing::get(|| async { "pong" }))
            .await;
        Ok(())
    }
}
