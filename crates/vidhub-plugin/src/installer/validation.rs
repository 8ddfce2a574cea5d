//! Allow-list checks run before any package-manager command is built.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use vidhub_core::{AppError, AppResult};

static NPM_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(vidhub-plugin-|vidhub-theme-)[a-z0-9._-]+$"));

static STABLE_VERSION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$"));

fn matches(pattern: &LazyLock<Result<Regex, regex::Error>>, value: &str) -> AppResult<bool> {
    match pattern.as_ref() {
        Ok(re) => Ok(re.is_match(value)),
        Err(e) => Err(AppError::internal(format!("Invalid allow-list pattern: {e}"))),
    }
}

/// Refuses anything but a lowercase, namespaced package name.
pub fn check_npm_name(name: &str) -> AppResult<()> {
    if !matches(&NPM_NAME, name)? {
        return Err(AppError::security(format!(
            "Invalid extension name '{}'",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Refuses anything but a three-part numeric version.
pub fn check_version(version: &str) -> AppResult<()> {
    if !matches(&STABLE_VERSION, version)? {
        return Err(AppError::security(format!(
            "Invalid extension version '{}'",
            version.escape_debug()
        )));
    }
    Ok(())
}

/// Refuses local install paths with parent traversal or shell metacharacters.
pub fn check_disk_path(path: &Path) -> AppResult<()> {
    let raw = path.to_string_lossy();

    if raw.is_empty() {
        return Err(AppError::security("Empty extension path"));
    }

    if raw
        .chars()
        .any(|c| c.is_control() || ";|&$`<>\"'\\*?(){}[]!#~".contains(c))
    {
        return Err(AppError::security(format!(
            "Extension path '{}' contains forbidden characters",
            raw.escape_debug()
        )));
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(AppError::security(format!(
            "Extension path '{raw}' escapes its directory"
        )));
    }

    Ok(())
}
