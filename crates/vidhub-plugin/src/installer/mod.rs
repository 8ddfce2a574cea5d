//! Package installer: fetches and removes extension code with the external
//! package manager.
//!
//! Names, versions and local paths pass the allow-list in [`validation`]
//! before any command is built. Arguments are handed to the process
//! directly, never through a shell.

pub mod index;
pub mod runner;
pub mod validation;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use vidhub_core::AppResult;

pub use index::{DisabledPluginIndex, HttpPluginIndex, PluginIndex};
pub use runner::{CommandBuilder, CommandRunner, PackageCommand, ProcessRunner};

use validation::{check_disk_path, check_npm_name, check_version};

/// Directory (under the extensions directory) holding installed packages.
pub const PACKAGES_DIR: &str = "node_modules";

/// What `install` put on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Namespaced name.
    pub npm_name: String,
    /// Requested version, if one was pinned.
    pub version: Option<String>,
    /// Directory holding the package.
    pub path: PathBuf,
}

/// Drives the package manager inside the extensions directory.
#[derive(Debug, Clone)]
pub struct PackageInstaller {
    directory: PathBuf,
    commands: CommandBuilder,
    runner: Arc<dyn CommandRunner>,
    index: Arc<dyn PluginIndex>,
    host_version: String,
}

impl PackageInstaller {
    /// Creates an installer working in `directory`.
    pub fn new(
        directory: &Path,
        package_manager: &str,
        runner: Arc<dyn CommandRunner>,
        index: Arc<dyn PluginIndex>,
        host_version: &str,
    ) -> Self {
        Self {
            directory: directory.to_path_buf(),
            commands: CommandBuilder::new(package_manager, directory),
            runner,
            index,
            host_version: host_version.to_string(),
        }
    }

    /// Extensions directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where an installed package lives.
    pub fn package_path(&self, npm_name: &str) -> PathBuf {
        self.directory.join(PACKAGES_DIR).join(npm_name)
    }

    /// Installs from the registry, or from a local directory when `from_disk`.
    ///
    /// Without an explicit version the plugin index is asked for the latest
    /// version compatible with this host. On failure the package is removed
    /// again (best effort) and the original error is returned.
    pub async fn install(
        &self,
        target: &str,
        version: Option<&str>,
        from_disk: bool,
    ) -> AppResult<InstalledPackage> {
        let npm_name = Self::check_target(target, version, from_disk)?;
        let (spec, version) = if from_disk {
            (format!("file:{target}"), None)
        } else {
            let version = match version {
                Some(v) => Some(v.to_string()),
                None => self.resolve_version(target).await,
            };
            let spec = match &version {
                Some(v) => format!("{target}@{v}"),
                None => target.to_string(),
            };
            (spec, version)
        };

        self.ensure_manifest().await?;

        info!(npm_name = %npm_name, spec = %spec, "Installing extension package");

        if let Err(err) = self.runner.run(&self.commands.add(&spec)).await {
            if let Err(cleanup) = self.remove(&npm_name).await {
                warn!(
                    npm_name = %npm_name,
                    error = %cleanup,
                    "Cannot remove partially installed package"
                );
            }
            return Err(err);
        }

        Ok(InstalledPackage {
            path: self.package_path(&npm_name),
            npm_name,
            version,
        })
    }

    /// Upgrades an installed package in place.
    ///
    /// `PluginManager::update` does not use this: it unregisters and runs a
    /// fresh [`install`](Self::install) so the new code is loaded from
    /// scratch. This is for callers that handle registration themselves.
    pub async fn update(
        &self,
        target: &str,
        version: Option<&str>,
        from_disk: bool,
    ) -> AppResult<InstalledPackage> {
        let npm_name = Self::check_target(target, version, from_disk)?;
        let spec = match (from_disk, version) {
            (true, _) => format!("file:{target}"),
            (false, Some(v)) => format!("{target}@{v}"),
            (false, None) => target.to_string(),
        };

        self.ensure_manifest().await?;

        info!(npm_name = %npm_name, spec = %spec, "Updating extension package");
        self.runner.run(&self.commands.upgrade(&spec)).await?;

        Ok(InstalledPackage {
            path: self.package_path(&npm_name),
            npm_name,
            version: version.map(str::to_string),
        })
    }

    /// Validates an install target without touching anything and returns
    /// the namespaced name it refers to.
    ///
    /// Registry targets must be namespaced package names with an optional
    /// stable version; disk targets must be safe paths whose
    /// directory name is a namespaced package name.
    pub fn check_target(
        target: &str,
        version: Option<&str>,
        from_disk: bool,
    ) -> AppResult<String> {
        if from_disk {
            return disk_npm_name(target);
        }
        check_npm_name(target)?;
        if let Some(v) = version {
            check_version(v)?;
        }
        Ok(target.to_string())
    }

    /// Removes an installed package.
    pub async fn remove(&self, npm_name: &str) -> AppResult<()> {
        check_npm_name(npm_name)?;
        self.ensure_manifest().await?;

        info!(npm_name = %npm_name, "Removing extension package");
        self.runner.run(&self.commands.remove(npm_name)).await
    }

    async fn resolve_version(&self, npm_name: &str) -> Option<String> {
        let resolved =
            index::resolve_or_unspecified(self.index.as_ref(), npm_name, &self.host_version).await;

        match resolved {
            Some(v) if check_version(&v).is_ok() => Some(v),
            Some(v) => {
                warn!(npm_name = %npm_name, version = %v, "Ignoring invalid version from plugin index");
                None
            }
            None => None,
        }
    }

    /// Creates the extensions directory and an empty `package.json` if needed.
    async fn ensure_manifest(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let manifest = self.directory.join("package.json");
        if !tokio::fs::try_exists(&manifest).await? {
            tokio::fs::write(&manifest, b"{}").await?;
        }
        Ok(())
    }
}

/// Namespaced name of a local package: its directory name.
fn disk_npm_name(target: &str) -> AppResult<String> {
    let path = Path::new(target);
    check_disk_path(path)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    check_npm_name(&name)?;
    Ok(name)
}
