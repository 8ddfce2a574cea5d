//! The aggregated global CSS asset.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use vidhub_core::{AppError, AppResult};

/// One file on disk concatenating the CSS of every registered plugin.
#[derive(Debug)]
pub struct GlobalCss {
    path: PathBuf,
    lock: Mutex<()>,
}

impl GlobalCss {
    /// Creates a handle on the CSS file at `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the CSS file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the CSS files of one package, in order.
    pub async fn append(&self, package_dir: &Path, css: &[String]) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        self.append_unlocked(package_dir, css).await
    }

    /// Rewrites the file from scratch over the given packages, in order.
    pub async fn regenerate(&self, packages: &[(PathBuf, Vec<String>)]) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        self.truncate().await?;
        for (dir, css) in packages {
            self.append_unlocked(dir, css).await?;
        }
        debug!(path = %self.path.display(), packages = packages.len(), "Global CSS regenerated");
        Ok(())
    }

    /// Current content.
    pub async fn read(&self) -> AppResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn truncate(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, b"").await?;
        Ok(())
    }

    async fn append_unlocked(&self, package_dir: &Path, css: &[String]) -> AppResult<()> {
        if css.is_empty() {
            return Ok(());
        }

        let mut out = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        for relative in css {
            let source = package_dir.join(relative);
            let content = tokio::fs::read(&source).await.map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::Storage,
                    format!("Cannot read CSS file '{}'", source.display()),
                    e,
                )
            })?;
            out.write_all(&content).await?;
            out.write_all(b"\n").await?;
        }
        out.flush().await?;
        Ok(())
    }
}
