//! Remote plugin index: "latest version compatible with this host".

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vidhub_core::{AppError, AppResult};

/// Resolves the latest compatible version of an extension.
#[async_trait]
pub trait PluginIndex: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the latest version of `npm_name` compatible with
    /// `host_version`, or `None` if the index does not know one.
    async fn resolve_latest_version(
        &self,
        npm_name: &str,
        host_version: &str,
    ) -> AppResult<Option<String>>;
}

/// Index that never knows any version.
#[derive(Debug, Clone, Default)]
pub struct DisabledPluginIndex;

#[async_trait]
impl PluginIndex for DisabledPluginIndex {
    async fn resolve_latest_version(&self, _: &str, _: &str) -> AppResult<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LatestVersionRequest<'a> {
    npm_names: Vec<&'a str>,
    current_engine: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestVersionEntry {
    npm_name: String,
    latest_version: Option<String>,
}

/// Index client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPluginIndex {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPluginIndex {
    /// Creates a client for the index at `base_url`.
    pub fn new(base_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::Configuration,
                    "Cannot build plugin index client",
                    e,
                )
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/plugins/latest-version", self.base_url)
    }
}

#[async_trait]
impl PluginIndex for HttpPluginIndex {
    async fn resolve_latest_version(
        &self,
        npm_name: &str,
        host_version: &str,
    ) -> AppResult<Option<String>> {
        let body = LatestVersionRequest {
            npm_names: vec![npm_name],
            current_engine: host_version,
        };

        debug!(npm_name = %npm_name, url = %self.endpoint(), "Querying plugin index");

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                AppError::with_source(
                    vidhub_core::error::ErrorKind::ExternalService,
                    format!("Plugin index request failed for '{npm_name}'"),
                    e,
                )
            })?;

        let entries: Vec<LatestVersionEntry> = response.json().await.map_err(|e| {
            AppError::with_source(
                vidhub_core::error::ErrorKind::ExternalService,
                "Malformed plugin index response",
                e,
            )
        })?;

        Ok(latest_for(entries, npm_name))
    }
}

/// The entry the index returned for `npm_name`, if any.
fn latest_for(entries: Vec<LatestVersionEntry>, npm_name: &str) -> Option<String> {
    entries
        .into_iter()
        .find(|e| e.npm_name == npm_name)
        .and_then(|e| e.latest_version)
}

/// Resolves a version, degrading any index failure to `None`.
pub async fn resolve_or_unspecified(
    index: &dyn PluginIndex,
    npm_name: &str,
    host_version: &str,
) -> Option<String> {
    match index.resolve_latest_version(npm_name, host_version).await {
        Ok(version) => version,
        Err(e) => {
            warn!(
                npm_name = %npm_name,
                error = %e,
                "Cannot resolve latest compatible version, installing unspecified version"
            );
            None
        }
    }
}
