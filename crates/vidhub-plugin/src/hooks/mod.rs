//! Hook system: catalogue, registry, and dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{HookType, hook_type, is_server_hook};
pub use dispatcher::{FailureReason, HookDispatcher, HookFailure};
pub use registry::{HookEntry, HookHandler, HookRegistry};
