//! # vidhub-plugin
//!
//! Extension host for VidHub. Provides:
//!
//! - Hook catalogue, priority-ordered registry and filter/action/static dispatch
//! - Register helpers scoped to one plugin (hooks, settings, storage, router,
//!   vocabulary changes)
//! - Package lifecycle: install, update, uninstall through the package manager
//! - Registration of plugins and themes with full rollback on unregister
//! - Optional dynamic loading via `libloading` (feature `dynamic`)

pub mod constants;
pub mod css;
pub mod ffi;
pub mod helpers;
pub mod hooks;
pub mod installer;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod prelude;
pub mod registry;
pub mod store;
pub mod template;
pub mod traits;
pub mod translations;

pub use constants::ConstantRegistry;
pub use helpers::RegisterHelpers;
pub use hooks::{HookDispatcher, HookRegistry, HookType};
pub use loader::{ModuleLoader, PluginModule, StaticModuleLoader};
#[cfg(feature = "dynamic")]
pub use loader::DynamicModuleLoader;
pub use manager::{InstallOptions, PluginManager, PluginManagerBuilder};
pub use registry::{PluginRegistry, PluginState, RegisteredPlugin, RegisteredPluginInfo};
pub use store::{FilePluginStore, MemoryPluginStore, PluginRecord, PluginStore, PluginType};
pub use traits::ServerPlugin;
