//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use crate::helpers::{
    ConstantManager, PluginRouter, PrivacyManager, RegisterHelpers, RegisterHookOptions,
    RegisterSettingOptions, SettingsManager, StorageManager,
};
pub use crate::hooks::{HookHandler, HookType};
pub use crate::traits::ServerPlugin;
