//! Registration and unregistration of installed extensions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Map, Value, json};

use vidhub_core::error::ErrorKind;
use vidhub_plugin::{PluginState, PluginStore, PluginType};
use vidhub_plugin_sdk::prelude::*;

use crate::helpers::{LanguageEditor, Package, Tagger, TestHost};

#[tokio::test]
async fn test_failing_register_does_not_stop_the_batch() {
    let host = TestHost::new();
    host.seed_plugin("first", Tagger::new("first", 0)).await;
    host.seed_plugin(
        "second",
        LanguageEditor {
            add: vec![("xx", "Xyzzy")],
            fail: true,
            ..Default::default()
        },
    )
    .await;
    host.seed_plugin("third", Tagger::new("third", 0)).await;

    host.manager.register_all_enabled().await.unwrap();

    assert_eq!(host.manager.state("vidhub-plugin-first").await, PluginState::Registered);
    assert_eq!(host.manager.state("vidhub-plugin-third").await, PluginState::Registered);
    assert!(!host.manager.is_registered("vidhub-plugin-second").await);
    assert_eq!(host.manager.state("vidhub-plugin-second").await, PluginState::Unloaded);

    // What the failing plugin changed before throwing is rolled back.
    let languages = host
        .manager
        .constants()
        .table(vidhub_core::constants::ConstantFamily::Language)
        .await;
    assert!(!languages.contains_key(&ConstantKey::from("xx")));
}

#[tokio::test]
async fn test_unregister_purges_only_its_hooks() {
    let host = TestHost::new();
    host.seed_plugin("a", Tagger::new("a", 5)).await;
    host.seed_plugin("b", Tagger::new("b", 5)).await;
    host.seed_plugin("c", Tagger::new("c", 1)).await;
    host.seed_plugin("d", Tagger::new("d", 5)).await;
    host.manager.register_all_enabled().await.unwrap();

    let hook = "filter:api.video.get.result";
    let before = host.manager.run_hook(hook, json!([]), Value::Null).await;
    assert_eq!(before, json!(["a", "b", "d", "c"]));

    host.manager.unregister("vidhub-plugin-b").await.unwrap();

    let after = host.manager.run_hook(hook, json!([]), Value::Null).await;
    assert_eq!(after, json!(["a", "d", "c"]));
}

#[tokio::test]
async fn test_unregister_unknown_fails() {
    let host = TestHost::new();
    let err = host.manager.unregister("vidhub-plugin-ghost").await.unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_theme_loads_no_code() {
    let host = TestHost::new();
    host.seed(Package::new("vidhub-theme-dark", "1.0.0").css("dark.css", ".dark{}"))
        .await;
    host.seed_plugin("styled", Tagger::new("styled", 0)).await;

    host.manager.register_all_enabled().await.unwrap();

    let theme = host
        .manager
        .get_registered_theme_by_short_name("dark")
        .await
        .unwrap();
    assert!(theme.runtime.is_none());
    assert_eq!(theme.css, vec!["dark.css"]);
    assert_eq!(host.loader.load_count("vidhub-theme-dark").await, 0);

    // Theme CSS stays out of the aggregated plugin CSS.
    assert!(!host.manager.global_css().await.unwrap().contains(".dark{}"));
    assert_eq!(host.manager.get_registered_themes().await.len(), 1);
    assert_eq!(host.manager.get_registered_plugins().await.len(), 1);
}

#[tokio::test]
async fn test_global_css_regenerated_on_unregister() {
    let host = TestHost::new();
    for (name, rule) in [("red", ".red{}"), ("blue", ".blue{}")] {
        let npm_name = PluginType::Plugin.build_npm_name(name);
        host.provide(&npm_name, Tagger::new("x", 0)).await;
        host.seed(Package::new(&npm_name, "1.0.0").css("style.css", rule))
            .await;
    }

    host.manager.register_all_enabled().await.unwrap();
    assert_eq!(host.manager.global_css().await.unwrap(), ".red{}\n.blue{}\n");

    host.manager.unregister("vidhub-plugin-red").await.unwrap();
    assert_eq!(host.manager.global_css().await.unwrap(), ".blue{}\n");
}

#[tokio::test]
async fn test_translations_follow_registration() {
    let host = TestHost::new();
    host.provide("vidhub-plugin-hello", Tagger::new("x", 0)).await;
    host.seed(
        Package::new("vidhub-plugin-hello", "1.0.0").translation(
            "fr",
            "languages/fr.json",
            json!({ "Hello": "Bonjour" }),
        ),
    )
    .await;

    host.manager.register_all_enabled().await.unwrap();
    let fr = host.manager.get_translations("fr-FR").await;
    assert_eq!(fr["vidhub-plugin-hello"]["Hello"], json!("Bonjour"));

    host.manager.unregister("vidhub-plugin-hello").await.unwrap();
    assert!(host.manager.get_translations("fr").await.is_empty());
}

struct Configurable {
    changes: Arc<AtomicUsize>,
}

#[async_trait]
impl ServerPlugin for Configurable {
    async fn register(&self, helpers: RegisterHelpers) -> anyhow::Result<()> {
        helpers
            .register_setting(
                RegisterSettingOptions::new("greeting", "input")
                    .label("Greeting")
                    .default_value(json!("hello")),
            )
            .await;

        let settings = helpers.settings_manager();
        assert_eq!(settings.get_setting("greeting").await?, Some(json!("hello")));

        let changes = self.changes.clone();
        settings
            .on_settings_change(move |_settings: Map<String, Value>| {
                let changes = changes.clone();
                async move {
                    changes.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        settings
            .on_settings_change(|_settings: Map<String, Value>| async {
                Err(anyhow::anyhow!("second callback fails"))
            })
            .await;

        helpers.storage_manager().store_data("seen", json!(true)).await?;
        assert!(helpers.data_directory_path().is_dir());
        Ok(())
    }
}

#[tokio::test]
async fn test_settings_and_change_callbacks() {
    let host = TestHost::new();
    let changes = Arc::new(AtomicUsize::new(0));
    host.seed_plugin(
        "configurable",
        Configurable {
            changes: changes.clone(),
        },
    )
    .await;
    host.manager.register_all_enabled().await.unwrap();
    assert!(host.manager.is_registered("vidhub-plugin-configurable").await);

    let settings = host
        .manager
        .get_registered_settings("vidhub-plugin-configurable")
        .await;
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].label.as_deref(), Some("Greeting"));

    host.manager
        .on_settings_changed("configurable", Map::new())
        .await
        .unwrap();
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    let err = host
        .manager
        .on_settings_changed("unknown", Map::new())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));

    let stored = host
        .store
        .get_data("configurable", PluginType::Plugin, "seen")
        .await
        .unwrap();
    assert_eq!(stored, Some(json!(true)));
}

#[tokio::test]
async fn test_missing_code_is_a_load_error() {
    let host = TestHost::new();
    let record = host
        .seed(Package::new("vidhub-plugin-nocode", "1.0.0"))
        .await;

    let err = host.manager.register(&record).await.unwrap_err();
    assert!(err.is(ErrorKind::PluginLoad));
    assert!(!host.manager.is_registered("vidhub-plugin-nocode").await);
}

#[tokio::test]
async fn test_invalid_manifest_is_a_validation_error() {
    let host = TestHost::new();
    host.provide("vidhub-plugin-sloppy", Tagger::new("x", 0)).await;
    let record = host
        .seed(Package::new("vidhub-plugin-sloppy", "1.0.0").without("bugs"))
        .await;

    let err = host.manager.register(&record).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));
    assert!(err.message.contains("bugs"));
}

#[tokio::test]
async fn test_double_register_conflicts() {
    let host = TestHost::new();
    let record = host.seed_plugin("once", Tagger::new("once", 0)).await;

    host.manager.register(&record).await.unwrap();
    let err = host.manager.register(&record).await.unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
    assert!(host.manager.is_registered("vidhub-plugin-once").await);
}

#[tokio::test]
async fn test_second_batch_keeps_loaded_extensions() {
    let host = TestHost::new();
    host.provide("vidhub-plugin-a", Tagger::new("a", 0)).await;
    host.seed(Package::new("vidhub-plugin-a", "1.0.0").css("a.css", ".a{}"))
        .await;
    host.manager.register_all_enabled().await.unwrap();

    // Installed in between; the second batch picks it up.
    host.seed_plugin("b", Tagger::new("b", 0)).await;
    host.manager.register_all_enabled().await.unwrap();

    assert_eq!(host.manager.state("vidhub-plugin-a").await, PluginState::Registered);
    assert_eq!(host.manager.state("vidhub-plugin-b").await, PluginState::Registered);
    let tags = host
        .manager
        .run_hook("filter:api.video.get.result", json!([]), Value::Null)
        .await;
    assert_eq!(tags, json!(["a", "b"]));
    assert_eq!(host.manager.global_css().await.unwrap(), ".a{}\n");
    assert_eq!(host.loader.load_count("vidhub-plugin-a").await, 1);
}
