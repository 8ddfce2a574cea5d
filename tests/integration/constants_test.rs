//! Vocabulary changes made by extensions and their rollback.

use vidhub_core::constants::{ConstantFamily, ConstantKey};

use crate::helpers::{LanguageEditor, TestHost};

async fn language(host: &TestHost, key: &str) -> Option<String> {
    host.manager
        .constants()
        .label(ConstantFamily::Language, &ConstantKey::from(key))
        .await
}

#[tokio::test]
async fn test_unregister_reverts_only_own_delta() {
    let host = TestHost::new();
    let original_en = language(&host, "en").await;
    assert!(original_en.is_some());

    let alpha = host
        .seed_plugin(
            "alpha",
            LanguageEditor {
                add: vec![("xx", "Xyzzy")],
                ..Default::default()
            },
        )
        .await;
    let beta = host
        .seed_plugin(
            "beta",
            LanguageEditor {
                delete: vec!["en"],
                ..Default::default()
            },
        )
        .await;

    host.manager.register(&alpha).await.unwrap();
    host.manager.register(&beta).await.unwrap();
    assert_eq!(language(&host, "xx").await.as_deref(), Some("Xyzzy"));
    assert_eq!(language(&host, "en").await, None);

    host.manager.unregister("vidhub-plugin-alpha").await.unwrap();
    assert_eq!(language(&host, "xx").await, None);
    assert_eq!(language(&host, "en").await, None);

    host.manager.unregister("vidhub-plugin-beta").await.unwrap();
    assert_eq!(language(&host, "en").await, original_en);
}

#[tokio::test]
async fn test_duplicate_add_is_refused() {
    let host = TestHost::new();
    let record = host
        .seed_plugin(
            "dup",
            LanguageEditor {
                add: vec![("en", "Not English")],
                ..Default::default()
            },
        )
        .await;

    host.manager.register(&record).await.unwrap();
    assert_eq!(language(&host, "en").await.as_deref(), Some("English"));

    // Nothing was recorded, so unregistering must not remove "en".
    host.manager.unregister("vidhub-plugin-dup").await.unwrap();
    assert_eq!(language(&host, "en").await.as_deref(), Some("English"));
}

#[tokio::test]
async fn test_add_then_delete_nets_out() {
    let host = TestHost::new();
    let before = host.manager.constants().table(ConstantFamily::Language).await;

    let record = host
        .seed_plugin(
            "churn",
            LanguageEditor {
                add: vec![("zz", "Zed")],
                delete: vec!["zz", "fr"],
                ..Default::default()
            },
        )
        .await;
    host.manager.register(&record).await.unwrap();
    assert_eq!(language(&host, "zz").await, None);
    assert_eq!(language(&host, "fr").await, None);

    host.manager.unregister("vidhub-plugin-churn").await.unwrap();
    assert_eq!(
        host.manager.constants().table(ConstantFamily::Language).await,
        before
    );
}
