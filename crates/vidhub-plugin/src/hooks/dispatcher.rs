//! Hook dispatcher: runs filter, action, and static hooks.
//!
//! For `filter:` hooks:
//! - Handlers are called in priority order, each with the previous output.
//! - A failing handler is logged and its contribution dropped; the pipeline
//!   continues with the value it received.
//!
//! For `action:` hooks:
//! - Handlers are invoked in priority order and detached onto the runtime.
//! - Failures are logged and published, never returned to the caller.
//!
//! For static hooks:
//! - Handlers are awaited in priority order before `run` returns.
//!
//! Every failure (error, panic, or deadline) is also published on a
//! broadcast channel as a [`HookFailure`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error};

use super::definitions::{HookType, hook_type};
use super::registry::{HookEntry, HookHandler, HookRegistry};

/// Capacity of the failure broadcast channel.
const FAILURE_CHANNEL_CAPACITY: usize = 256;

/// Why a hook handler failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The handler returned an error.
    #[error("handler error: {0}")]
    Error(String),
    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),
    /// The handler exceeded the configured deadline.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),
}

/// A handler failure, as published on the failure channel.
#[derive(Debug, Clone)]
pub struct HookFailure {
    /// Hook name.
    pub hook: String,
    /// Owning extension.
    pub npm_name: String,
    /// Owning extension's short name.
    pub plugin_name: String,
    /// What went wrong.
    pub reason: FailureReason,
}

/// Dispatches hooks to all registered handlers.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Arc<HookRegistry>,
    /// Per-handler deadline; `None` waits forever.
    timeout: Option<Duration>,
    /// Failure channel.
    failures: broadcast::Sender<HookFailure>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new(registry: Arc<HookRegistry>, timeout: Option<Duration>) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            registry,
            timeout,
            failures,
        }
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Subscribes to handler failures.
    pub fn subscribe_failures(&self) -> broadcast::Receiver<HookFailure> {
        self.failures.subscribe()
    }

    /// Runs a hook.
    ///
    /// Filter hooks return the final value of the pipeline (`result` if no
    /// handler is registered). Action and static hooks return `Value::Null`.
    pub async fn run(&self, hook_name: &str, result: Value, params: Value) -> Value {
        let handlers = self.registry.get_handlers(hook_name).await;
        let kind = hook_type(hook_name);

        if handlers.is_empty() {
            return match kind {
                HookType::Filter => result,
                HookType::Action | HookType::Static => Value::Null,
            };
        }

        debug!(
            hook = %hook_name,
            kind = %kind,
            handler_count = handlers.len(),
            "Running hook"
        );

        match kind {
            HookType::Filter => self.run_filter(hook_name, &handlers, result, params).await,
            HookType::Action => {
                self.run_action(hook_name, &handlers, params);
                Value::Null
            }
            HookType::Static => {
                self.run_static(hook_name, &handlers, params).await;
                Value::Null
            }
        }
    }

    async fn run_filter(
        &self,
        hook_name: &str,
        handlers: &[HookEntry],
        mut value: Value,
        params: Value,
    ) -> Value {
        for entry in handlers {
            debug!(hook = %hook_name, npm_name = %entry.npm_name, "Running filter handler");

            match invoke(&entry.handler, value.clone(), params.clone(), self.timeout).await {
                Ok(next) => value = next,
                Err(reason) => report(&self.failures, hook_name, entry, reason),
            }
        }

        value
    }

    fn run_action(&self, hook_name: &str, handlers: &[HookEntry], params: Value) {
        for entry in handlers {
            debug!(hook = %hook_name, npm_name = %entry.npm_name, "Running action handler");

            let fut = match start(&entry.handler, Value::Null, params.clone()) {
                Ok(fut) => fut,
                Err(reason) => {
                    report(&self.failures, hook_name, entry, reason);
                    continue;
                }
            };

            let failures = self.failures.clone();
            let timeout = self.timeout;
            let hook = hook_name.to_string();
            let entry = entry.clone();

            tokio::spawn(async move {
                if let Err(reason) = finish(fut, timeout).await {
                    report(&failures, &hook, &entry, reason);
                }
            });
        }
    }

    async fn run_static(&self, hook_name: &str, handlers: &[HookEntry], params: Value) {
        for entry in handlers {
            debug!(hook = %hook_name, npm_name = %entry.npm_name, "Running static handler");

            if let Err(reason) =
                invoke(&entry.handler, Value::Null, params.clone(), self.timeout).await
            {
                report(&self.failures, hook_name, entry, reason);
            }
        }
    }
}

/// Calls the handler closure, catching a synchronous panic.
fn start(
    handler: &HookHandler,
    value: Value,
    params: Value,
) -> Result<super::registry::HookFuture, FailureReason> {
    std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(value, params)))
        .map_err(|payload| FailureReason::Panic(panic_message(payload.as_ref())))
}

/// Drives a handler future to completion under the deadline, catching panics.
async fn finish(
    fut: super::registry::HookFuture,
    timeout: Option<Duration>,
) -> Result<Value, FailureReason> {
    let guarded = AssertUnwindSafe(fut).catch_unwind();

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, guarded)
            .await
            .map_err(|_| FailureReason::Timeout(limit))?,
        None => guarded.await,
    };

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(FailureReason::Error(format!("{err:#}"))),
        Err(payload) => Err(FailureReason::Panic(panic_message(payload.as_ref()))),
    }
}

async fn invoke(
    handler: &HookHandler,
    value: Value,
    params: Value,
    timeout: Option<Duration>,
) -> Result<Value, FailureReason> {
    let fut = start(handler, value, params)?;
    finish(fut, timeout).await
}

fn report(
    failures: &broadcast::Sender<HookFailure>,
    hook_name: &str,
    entry: &HookEntry,
    reason: FailureReason,
) {
    error!(
        hook = %hook_name,
        npm_name = %entry.npm_name,
        plugin = %entry.plugin_name,
        reason = %reason,
        "Cannot run hook handler"
    );

    // No subscribers is fine.
    let _ = failures.send(HookFailure {
        hook: hook_name.to_string(),
        npm_name: entry.npm_name.clone(),
        plugin_name: entry.plugin_name.clone(),
        reason,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
