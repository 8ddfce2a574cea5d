//! Per-plugin HTTP sub-router.

use std::sync::Arc;

use axum::Router;
use axum::routing::MethodRouter;
use tokio::sync::RwLock;

/// A sub-router bound to one plugin.
///
/// The host mounts it under `/plugins/{name}/router` and
/// `/plugins/{name}/{version}/router`.
#[derive(Clone, Default)]
pub struct PluginRouter {
    inner: Arc<RwLock<Router>>,
}

impl PluginRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    pub async fn route(&self, path: &str, method_router: MethodRouter) {
        let mut router = self.inner.write().await;
        *router = std::mem::take(&mut *router).route(path, method_router);
    }

    /// Merges another router into this one.
    pub async fn merge(&self, other: Router) {
        let mut router = self.inner.write().await;
        *router = std::mem::take(&mut *router).merge(other);
    }

    /// Snapshot of the current routes.
    pub async fn router(&self) -> Router {
        self.inner.read().await.clone()
    }
}

impl std::fmt::Debug for PluginRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRouter").finish_non_exhaustive()
    }
}
