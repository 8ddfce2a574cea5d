//! Hook dispatch through registered extensions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use vidhub_plugin::hooks::FailureReason;
use vidhub_plugin_sdk::prelude::*;

use crate::helpers::{Tagger, TestHost};

/// Fails its filter step and reports every viewed video on a channel.
struct Flaky {
    viewed: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl ServerPlugin for Flaky {
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
        helpers
            .register_hook(
                RegisterHookOptions::new(
                    "filter:api.video.get.result",
                    HookHandler::sync(|_, _| Err(anyhow::anyhow!("cannot filter"))),
                )
                .priority(10),
            )
            .await;

        let viewed = self.viewed.clone();
        helpers
            .register_hook(RegisterHookOptions::new(
                "action:api.video.viewed",
                HookHandler::action(move |params| {
                    let viewed = viewed.clone();
                    async move {
                        viewed.send(params)?;
                        Ok(())
                    }
                }),
            ))
            .await;
        helpers
            .register_hook(RegisterHookOptions::new(
                "action:api.video.viewed",
                HookHandler::action(|_| async { Err(anyhow::anyhow!("view counter down")) }),
            ))
            .await;

        // Dropped: not a server hook.
        helpers
            .register_hook(RegisterHookOptions::new(
                "filter:api.does.not.exist",
                HookHandler::sync(|v, _| Ok(v)),
            ))
            .await;
        Ok(())
    }
}

#[tokio::test]
async fn test_failing_filter_keeps_previous_value() {
    let host = TestHost::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    host.seed_plugin("flaky", Flaky { viewed: tx }).await;
    host.seed_plugin("tagger", Tagger::new("tagged", 0)).await;
    host.manager.register_all_enabled().await.unwrap();

    let mut failures = host.manager.subscribe_hook_failures();
    let result = host
        .manager
        .run_hook("filter:api.video.get.result", json!(["start"]), Value::Null)
        .await;
    assert_eq!(result, json!(["start", "tagged"]));

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.npm_name, "vidhub-plugin-flaky");
    assert_eq!(failure.hook, "filter:api.video.get.result");
    assert!(matches!(failure.reason, FailureReason::Error(_)));

    assert_eq!(
        host.manager.hooks().handler_count("filter:api.does.not.exist").await,
        0
    );
}

#[tokio::test]
async fn test_action_runs_detached_and_reports_failures() {
    let host = TestHost::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    host.seed_plugin("flaky", Flaky { viewed: tx }).await;
    host.manager.register_all_enabled().await.unwrap();

    let mut failures = host.manager.subscribe_hook_failures();
    let result = host
        .manager
        .run_hook("action:api.video.viewed", Value::Null, json!({ "id": 7 }))
        .await;
    assert_eq!(result, Value::Null);

    let params = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(params, json!({ "id": 7 }));

    let failure = tokio::time::timeout(Duration::from_secs(5), failures.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failure.hook, "action:api.video.viewed");
    assert_eq!(failure.plugin_name, "flaky");
}

#[tokio::test]
async fn test_concurrent_runs_see_the_same_handlers() {
    let host = TestHost::new();
    host.seed_plugin("tagger", Tagger::new("tagged", 0)).await;
    host.manager.register_all_enabled().await.unwrap();

    let manager = Arc::clone(&host.manager);
    let results = futures::future::join_all((0..16).map(|_| {
        let manager = Arc::clone(&manager);
        async move {
            manager
                .run_hook("filter:api.video.get.result", json!([]), Value::Null)
                .await
        }
    }))
    .await;

    assert!(results.iter().all(|r| *r == json!(["tagged"])));
}
