//! Extension package manifest (`package.json`) reading and validation.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use vidhub_core::{AppError, AppResult};

use crate::installer::validation::check_npm_name;
use crate::store::PluginType;

/// File name of the manifest inside a package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Host engine requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRequirement {
    /// Host version range.
    #[serde(default)]
    pub vidhub: Option<String>,
}

/// A client script entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientScript {
    /// Relative path of the script.
    pub script: String,
    /// Client scopes the script applies to.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Parsed extension manifest.
///
/// Every field is optional at parse time so that [`PackageManifest::validate`]
/// can report all bad fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Namespaced name.
    #[serde(default)]
    pub name: String,
    /// Version.
    #[serde(default)]
    pub version: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Host engine requirement.
    #[serde(default)]
    pub engine: Option<EngineRequirement>,
    /// Homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,
    /// Author.
    #[serde(default)]
    pub author: Option<String>,
    /// Bug tracker URL.
    #[serde(default)]
    pub bugs: Option<String>,
    /// Server entry point (plugins only).
    #[serde(default)]
    pub library: Option<String>,
    /// Static directory alias → relative path.
    #[serde(default)]
    pub static_dirs: BTreeMap<String, String>,
    /// CSS files, in load order.
    #[serde(default)]
    pub css: Vec<String>,
    /// Client scripts.
    #[serde(default)]
    pub client_scripts: Vec<ClientScript>,
    /// Locale → translation file.
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Reads `package.json` from a package directory.
    pub async fn read(package_dir: &Path) -> AppResult<Self> {
        let path = package_dir.join(MANIFEST_FILE);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            AppError::with_source(
                vidhub_core::error::ErrorKind::Validation,
                format!("Cannot read manifest '{}'", path.display()),
                e,
            )
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::with_source(
                vidhub_core::error::ErrorKind::Validation,
                format!("Malformed manifest '{}'", path.display()),
                e,
            )
        })
    }

    /// Host engine version range, or an empty string.
    pub fn engine_version(&self) -> &str {
        self.engine
            .as_ref()
            .and_then(|e| e.vidhub.as_deref())
            .unwrap_or_default()
    }

    /// Checks the manifest for an extension of the given kind.
    ///
    /// All invalid fields are reported in one `Validation` error.
    pub fn validate(&self, plugin_type: PluginType) -> AppResult<()> {
        let mut bad = Vec::new();

        if check_npm_name(&self.name).is_err() || !self.name.starts_with(plugin_type.prefix()) {
            bad.push("name");
        }
        if self.version.trim().is_empty() {
            bad.push("version");
        }
        if self.description.as_deref().is_none_or(str::is_empty) {
            bad.push("description");
        }
        if self.engine_version().is_empty() {
            bad.push("engine");
        }
        if !self.homepage.as_deref().is_some_and(is_url) {
            bad.push("homepage");
        }
        if self.author.as_deref().is_none_or(str::is_empty) {
            bad.push("author");
        }
        if !self.bugs.as_deref().is_some_and(is_url) {
            bad.push("bugs");
        }
        if plugin_type == PluginType::Plugin && !self.library.as_deref().is_some_and(is_safe_path)
        {
            bad.push("library");
        }
        if !self.static_dirs.values().all(|p| is_safe_path(p)) {
            bad.push("staticDirs");
        }
        if !self.css.iter().all(|p| is_safe_path(p)) {
            bad.push("css");
        }
        if !self.client_scripts.iter().all(|s| is_safe_path(&s.script)) {
            bad.push("clientScripts");
        }
        if !self.translations.values().all(|p| is_safe_path(p)) {
            bad.push("translations");
        }

        if bad.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Manifest of '{}' is invalid (invalid fields: {})",
                self.name,
                bad.join(", ")
            )))
        }
    }
}

fn is_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://"))
        && value.len() > "https://".len()
        && !value.chars().any(char::is_whitespace)
}

/// Relative, non-empty, and staying inside the package directory.
pub fn is_safe_path(value: &str) -> bool {
    let path = Path::new(value);
    !value.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
