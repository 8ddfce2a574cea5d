//! The trait plugin authors implement.

use async_trait::async_trait;

use crate::helpers::RegisterHelpers;

/// Server side of a plugin.
///
/// `register` receives the plugin's capability object; `unregister` runs
/// before the host purges the plugin's hooks and constant changes.
#[async_trait]
pub trait ServerPlugin: Send + Sync + 'static {
    /// Registers hooks, settings, routes and constant changes.
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()>;

    /// Releases whatever `register` acquired outside the host.
    async fn unregister(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
