//! Extension translations, keyed by complete locale then extension.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use vidhub_core::{AppError, AppResult};

/// Short locale → complete locale.
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("ca", "ca-ES"),
    ("cs", "cs-CZ"),
    ("de", "de-DE"),
    ("el", "el-GR"),
    ("es", "es-ES"),
    ("eu", "eu-ES"),
    ("fa", "fa-IR"),
    ("fi", "fi-FI"),
    ("fr", "fr-FR"),
    ("gl", "gl-ES"),
    ("hu", "hu-HU"),
    ("it", "it-IT"),
    ("ja", "ja-JP"),
    ("nb", "nb-NO"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("pt", "pt-BR"),
    ("ru", "ru-RU"),
    ("sv", "sv-SE"),
    ("th", "th-TH"),
    ("tr", "tr-TR"),
    ("uk", "uk-UA"),
    ("vi", "vi-VN"),
    ("zh", "zh-Hans-CN"),
    ("zh-Hans", "zh-Hans-CN"),
    ("zh-CN", "zh-Hans-CN"),
    ("zh-Hant", "zh-Hant-TW"),
    ("zh-TW", "zh-Hant-TW"),
];

/// Expands a short locale (`fr`) to its complete form (`fr-FR`).
///
/// Unknown locales are returned unchanged.
pub fn complete_locale(locale: &str) -> String {
    LOCALE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == locale)
        .map(|(_, complete)| complete.to_string())
        .unwrap_or_else(|| locale.to_string())
}

/// Reads a translation file: a flat JSON object of key → string.
pub async fn load_translation_file(path: &Path) -> AppResult<Map<String, Value>> {
    let bytes = tokio::fs::read(path).await?;
    match serde_json::from_slice(&bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::validation(format!(
            "Translation file '{}' is not a JSON object",
            path.display()
        ))),
    }
}

/// `locale → npm_name → translations`.
#[derive(Debug, Default)]
pub struct TranslationStore {
    tables: RwLock<HashMap<String, HashMap<String, Map<String, Value>>>>,
}

impl TranslationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the translations of one extension for one locale.
    pub async fn add(&self, npm_name: &str, locale: &str, translations: Map<String, Value>) {
        self.tables
            .write()
            .await
            .entry(complete_locale(locale))
            .or_default()
            .insert(npm_name.to_string(), translations);
    }

    /// Drops every locale's translations of one extension.
    pub async fn remove(&self, npm_name: &str) {
        let mut tables = self.tables.write().await;
        for by_plugin in tables.values_mut() {
            by_plugin.remove(npm_name);
        }
        tables.retain(|_, by_plugin| !by_plugin.is_empty());
    }

    /// Translations of every extension for a locale.
    pub async fn get(&self, locale: &str) -> HashMap<String, Map<String, Value>> {
        self.tables
            .read()
            .await
            .get(&complete_locale(locale))
            .cloned()
            .unwrap_or_default()
    }
}
