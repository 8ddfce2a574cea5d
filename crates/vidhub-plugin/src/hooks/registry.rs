//! Hook registry: extensions register handlers by hook name with priority ordering.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Future returned by a hook handler.
pub type HookFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// A hook handler: `(current value, params) -> next value`.
///
/// Filter hooks use the returned value as the input of the next handler.
/// Action and static hooks ignore it.
#[derive(Clone)]
pub struct HookHandler {
    func: Arc<dyn Fn(Value, Value) -> HookFuture + Send + Sync>,
}

impl HookHandler {
    /// Creates a handler from an async closure.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |value, params| handler(value, params).boxed()),
        }
    }

    /// Creates a handler from a synchronous closure.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(Value, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(move |value, params| {
                let result = handler(value, &params);
                futures::future::ready(result).boxed()
            }),
        }
    }

    /// Creates a side-effect-only handler for action and static hooks.
    pub fn action<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |_value, params| {
                let fut = handler(params);
                async move {
                    fut.await?;
                    Ok(Value::Null)
                }
                .boxed()
            }),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, value: Value, params: Value) -> HookFuture {
        (self.func)(value, params)
    }
}

impl std::fmt::Debug for HookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookHandler")
            .field("func", &"<closure>")
            .finish()
    }
}

/// One registration of a handler on a hook.
#[derive(Debug, Clone)]
pub struct HookEntry {
    /// Namespaced name of the owning extension.
    pub npm_name: String,
    /// Short name of the owning extension, used in logs.
    pub plugin_name: String,
    /// The handler.
    pub handler: HookHandler,
    /// Priority (higher = earlier execution).
    pub priority: i32,
}

impl HookEntry {
    /// Creates a new entry.
    pub fn new(npm_name: &str, plugin_name: &str, handler: HookHandler, priority: i32) -> Self {
        Self {
            npm_name: npm_name.to_string(),
            plugin_name: plugin_name.to_string(),
            handler,
            priority,
        }
    }
}

/// Registry of hook handlers organized by hook name.
///
/// Insertion appends; ordering is restored by [`HookRegistry::sort_by_priority`],
/// which the plugin manager calls once per registration batch.
#[derive(Debug)]
pub struct HookRegistry {
    /// Hook name → handlers, sorted by priority after each batch.
    hooks: RwLock<HashMap<String, Vec<HookEntry>>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a handler to a hook without re-sorting.
    pub async fn add(&self, hook_name: &str, entry: HookEntry) {
        debug!(
            hook = %hook_name,
            npm_name = %entry.npm_name,
            priority = entry.priority,
            "Hook handler registered"
        );

        let mut hooks = self.hooks.write().await;
        hooks.entry(hook_name.to_string()).or_default().push(entry);
    }

    /// Sorts every hook's handlers by priority, highest first.
    ///
    /// The sort is stable: equal priorities keep registration order.
    pub async fn sort_by_priority(&self) {
        let mut hooks = self.hooks.write().await;
        for entries in hooks.values_mut() {
            entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
    }

    /// Removes every handler owned by an extension, on any hook.
    ///
    /// Returns the number of removed handlers.
    pub async fn unregister_plugin(&self, npm_name: &str) -> usize {
        let mut hooks = self.hooks.write().await;
        let mut removed = 0;

        for entries in hooks.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.npm_name != npm_name);
            removed += before - entries.len();
        }

        hooks.retain(|_, entries| !entries.is_empty());

        info!(npm_name = %npm_name, removed = removed, "Hooks unregistered for plugin");

        removed
    }

    /// Returns a snapshot of the handlers of a hook, in execution order.
    pub async fn get_handlers(&self, hook_name: &str) -> Vec<HookEntry> {
        let hooks = self.hooks.read().await;
        hooks.get(hook_name).cloned().unwrap_or_default()
    }

    /// Returns the number of handlers registered for a hook.
    pub async fn handler_count(&self, hook_name: &str) -> usize {
        let hooks = self.hooks.read().await;
        hooks.get(hook_name).map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns all hook names with at least one handler.
    pub async fn registered_hooks(&self) -> Vec<String> {
        let hooks = self.hooks.read().await;
        hooks.keys().cloned().collect()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
