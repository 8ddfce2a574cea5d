//! HTTP server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where `vidhub-server` listens and how long it waits on shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on unregistering every extension at shutdown.
    pub shutdown_grace_seconds: u64,
}

impl ServerConfig {
    /// `host:port`, as handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shutdown grace period.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9000,
            shutdown_grace_seconds: 30,
        }
    }
}
