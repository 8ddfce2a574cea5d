//! Symbols a dynamic plugin library exports.
//!
//! Libraries are built with the same compiler and `vidhub-plugin` version as
//! the host, so the entry points use the Rust ABI and pass host types
//! directly. The ABI version symbol guards against mismatched builds.

use futures::future::BoxFuture;

use crate::helpers::RegisterHelpers;

/// Version of the entry-point contract below.
pub const ABI_VERSION: u32 = 1;

/// `fn vidhub_plugin_abi_version() -> u32`
pub const ABI_VERSION_SYMBOL: &[u8] = b"vidhub_plugin_abi_version";

/// `fn vidhub_plugin_register(RegisterHelpers) -> BoxFuture<'static, anyhow::Result<()>>`
pub const REGISTER_SYMBOL: &[u8] = b"vidhub_plugin_register";

/// `fn vidhub_plugin_unregister() -> BoxFuture<'static, anyhow::Result<()>>`
pub const UNREGISTER_SYMBOL: &[u8] = b"vidhub_plugin_unregister";

/// Type of the ABI version function.
pub type AbiVersionFn = fn() -> u32;

/// Type of the register entry point.
pub type RegisterFn = fn(RegisterHelpers) -> BoxFuture<'static, anyhow::Result<()>>;

/// Type of the unregister entry point.
pub type UnregisterFn = fn() -> BoxFuture<'static, anyhow::Result<()>>;
