//! # vidhub-plugin-sdk
//!
//! SDK for writing VidHub server plugins.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vidhub_plugin_sdk::prelude::*;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl ServerPlugin for Hello {
//!     async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
//!         helpers
//!             .register_hook(RegisterHookOptions::new(
//!                 "filter:api.video.get.result",
//!                 HookHandler::sync(|video, _| Ok(video)),
//!             ))
//!             .await;
//!         Ok(())
//!     }
//! }
//!
//! vidhub_plugin_sdk::export_plugin!(Hello);
//! ```
//!
//! Build the crate as a `cdylib` with the same toolchain as the host and
//! point the manifest's `library` field at the resulting file.

pub mod macros;

pub use anyhow;
pub use futures::future::BoxFuture;
pub use serde_json;
pub use tracing;

pub use vidhub_core::constants::ConstantKey;
pub use vidhub_plugin::ffi::abi::ABI_VERSION;

/// Prelude for convenient imports.
pub mod prelude {
    pub use vidhub_plugin::prelude::*;

    pub use serde_json::{Map, Value, json};
    pub use vidhub_core::constants::ConstantKey;
}
