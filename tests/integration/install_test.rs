//! Package lifecycle: install, update, uninstall.

use vidhub_core::error::ErrorKind;
use vidhub_plugin::{InstallOptions, PluginStore};

use crate::helpers::{Package, Pinger, Tagger, TestHost};

#[tokio::test]
async fn test_injection_rejected_before_any_command() {
    let host = TestHost::new();

    let bad_name = host
        .manager
        .install(InstallOptions::new("foo; rm -rf /"))
        .await
        .unwrap_err();
    let bad_version = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-valid").version("1.0; evil"))
        .await
        .unwrap_err();

    assert!(bad_name.is(ErrorKind::Security));
    assert!(bad_version.is(ErrorKind::Security));
    assert!(host.runner.calls().is_empty());
}

#[tokio::test]
async fn test_install_registers_and_persists() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.2.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;

    let record = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-hello").version("1.2.0"))
        .await
        .unwrap();

    assert_eq!(record.name, "hello");
    assert_eq!(record.version, "1.2.0");
    assert!(record.enabled && !record.uninstalled);
    assert!(host.manager.is_registered("vidhub-plugin-hello").await);
    assert_eq!(
        host.runner.calls(),
        vec![vec!["add".to_string(), "vidhub-plugin-hello@1.2.0".to_string()]]
    );
    assert!(host.dir.path().join("plugins").join("package.json").is_file());
}

#[tokio::test]
async fn test_install_without_register() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-theme-plain", "1.0.0"));

    host.manager
        .install(InstallOptions::new("vidhub-theme-plain").without_register())
        .await
        .unwrap();

    assert!(!host.manager.is_registered("vidhub-theme-plain").await);
    let record = host.store.load_by_npm_name("vidhub-theme-plain").await.unwrap();
    assert!(record.is_some_and(|r| r.enabled));
}

#[tokio::test]
async fn test_invalid_manifest_rolls_back_files() {
    let host = TestHost::new();
    host.runner
        .publish(Package::new("vidhub-plugin-broken", "1.0.0").without("description"));

    let err = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-broken"))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Validation));
    assert!(!host.package_dir("vidhub-plugin-broken").exists());
    assert!(!host.manager.is_registered("vidhub-plugin-broken").await);
    assert!(
        host.runner
            .calls()
            .iter()
            .any(|c| c == &["remove", "vidhub-plugin-broken"])
    );
    assert!(
        host.store
            .load_by_npm_name("vidhub-plugin-broken")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_failing_register_uninstalls() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-nocode", "1.0.0"));

    let err = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-nocode"))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::PluginLoad));
    assert!(!host.package_dir("vidhub-plugin-nocode").exists());
    let record = host
        .store
        .load_by_npm_name("vidhub-plugin-nocode")
        .await
        .unwrap()
        .unwrap();
    assert!(!record.enabled && record.uninstalled);
}

#[tokio::test]
async fn test_package_manager_failure_is_surfaced() {
    let host = TestHost::new();
    host.runner.fail_adds(true);

    let err = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-offline"))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Installation));
    assert_eq!(
        host.runner.calls(),
        vec![
            vec!["add".to_string(), "vidhub-plugin-offline".to_string()],
            vec!["remove".to_string(), "vidhub-plugin-offline".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_install_from_disk() {
    let host = TestHost::new();
    let source = host.dir.path().join("src").join("vidhub-plugin-local");
    Package::new("vidhub-plugin-local", "0.3.0").write_to(&source);
    host.provide("vidhub-plugin-local", Tagger::new("local", 0)).await;

    let record = host
        .manager
        .install(InstallOptions::new(&source.to_string_lossy()).from_disk())
        .await
        .unwrap();

    assert_eq!(record.version, "0.3.0");
    assert!(host.manager.is_registered("vidhub-plugin-local").await);
    assert!(host.package_dir("vidhub-plugin-local").join("package.json").is_file());
}

#[tokio::test]
async fn test_update_uses_latest_compatible_version() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.0.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;
    host.manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();

    let mut record = host
        .store
        .load_by_npm_name("vidhub-plugin-hello")
        .await
        .unwrap()
        .unwrap();
    record.latest_version = Some("2.0.0".to_string());
    host.store.save(record).await.unwrap();
    host.runner.publish(Package::new("vidhub-plugin-hello", "2.0.0"));

    let updated = host
        .manager
        .update("vidhub-plugin-hello", None, false)
        .await
        .unwrap();

    assert_eq!(updated.version, "2.0.0");
    let registered = host
        .manager
        .get_registered_plugin_or_theme("vidhub-plugin-hello")
        .await
        .unwrap();
    assert_eq!(registered.version, "2.0.0");
    assert!(
        host.runner
            .calls()
            .iter()
            .any(|c| c == &["add", "vidhub-plugin-hello@2.0.0"])
    );
    // The module cache was invalidated, so the code was loaded again.
    assert_eq!(host.loader.load_count("vidhub-plugin-hello").await, 2);
}

#[tokio::test]
async fn test_failed_update_leaves_extension_uninstalled() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.0.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;
    host.manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();

    host.runner.fail_adds(true);
    let err = host
        .manager
        .update("vidhub-plugin-hello", Some("2.0.0"), false)
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Installation));
    assert!(!host.manager.is_registered("vidhub-plugin-hello").await);
    assert!(!host.package_dir("vidhub-plugin-hello").exists());
    let record = host
        .store
        .load_by_npm_name("vidhub-plugin-hello")
        .await
        .unwrap()
        .unwrap();
    assert!(!record.enabled);
    assert!(record.uninstalled);
}

#[tokio::test]
async fn test_update_unknown_fails() {
    let host = TestHost::new();
    let err = host
        .manager
        .update("vidhub-plugin-ghost", None, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
    assert!(host.runner.calls().is_empty());
}

#[tokio::test]
async fn test_uninstall() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.0.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;
    host.manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();

    host.manager
        .uninstall("vidhub-plugin-hello", true)
        .await
        .unwrap();

    assert!(!host.manager.is_registered("vidhub-plugin-hello").await);
    assert!(!host.package_dir("vidhub-plugin-hello").exists());
    let record = host
        .store
        .load_by_npm_name("vidhub-plugin-hello")
        .await
        .unwrap()
        .unwrap();
    assert!(!record.enabled && record.uninstalled);

    // Second time and unknown names are no-ops.
    let calls = host.runner.calls().len();
    host.manager
        .uninstall("vidhub-plugin-hello", true)
        .await
        .unwrap();
    host.manager
        .uninstall("vidhub-plugin-ghost", true)
        .await
        .unwrap();
    assert_eq!(host.runner.calls().len(), calls);
}

#[tokio::test]
async fn test_reinstall_after_uninstall() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.0.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;

    host.manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();
    host.manager
        .uninstall("vidhub-plugin-hello", true)
        .await
        .unwrap();
    let record = host
        .manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();

    assert!(record.enabled && !record.uninstalled);
    assert!(host.manager.is_registered("vidhub-plugin-hello").await);
}

#[tokio::test]
async fn test_rejected_update_target_leaves_extension_running() {
    let host = TestHost::new();
    host.runner.publish(Package::new("vidhub-plugin-hello", "1.0.0"));
    host.provide("vidhub-plugin-hello", Pinger).await;
    host.manager
        .install(InstallOptions::new("vidhub-plugin-hello"))
        .await
        .unwrap();
    let calls = host.runner.calls().len();

    let err = host
        .manager
        .update("vidhub-plugin-hello", Some("2.0; evil"), false)
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Security));
    assert!(host.manager.is_registered("vidhub-plugin-hello").await);
    assert!(host.manager.get_router("vidhub-plugin-hello").await.is_some());
    assert!(host.package_dir("vidhub-plugin-hello").join("package.json").is_file());
    let record = host
        .store
        .load_by_npm_name("vidhub-plugin-hello")
        .await
        .unwrap()
        .unwrap();
    assert!(record.enabled && !record.uninstalled);
    assert_eq!(host.runner.calls().len(), calls);
}
