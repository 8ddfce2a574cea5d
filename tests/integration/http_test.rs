//! Extension-facing HTTP routes.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use vidhub::http::{HostState, build_router};

use crate::helpers::{Package, Pinger, TestHost};

async fn get(host: &TestHost, uri: &str) -> Response {
    let state = HostState {
        manager: host.manager.clone(),
    };
    build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn host_with_hello() -> TestHost {
    let host = TestHost::new();
    host.provide("vidhub-plugin-hello", Pinger).await;
    host.seed(
        Package::new("vidhub-plugin-hello", "1.0.0")
            .css("assets/style.css", ".hello{}")
            .translation("fr", "languages/fr.json", json!({"Hello": "Bonjour"}))
            .static_file("images", "static/images", "logo.svg", "<svg/>"),
    )
    .await;
    host.manager.register_all_enabled().await.unwrap();
    host
}

#[tokio::test]
async fn test_plugin_router_is_mounted() {
    let host = host_with_hello().await;

    let response = get(&host, "/plugins/hello/router/ping").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "pong");

    let response = get(&host, "/plugins/hello/1.0.0/router/ping?x=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "pong");
}

#[tokio::test]
async fn test_wrong_version_or_unknown_plugin_is_not_found() {
    let host = host_with_hello().await;

    let wrong_version = get(&host, "/plugins/hello/9.9.9/router/ping").await;
    assert_eq!(wrong_version.status(), StatusCode::NOT_FOUND);

    let unknown = get(&host, "/plugins/ghost/router/ping").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_text(unknown).await).unwrap();
    assert_eq!(body["error"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_router_disappears_on_unregister() {
    let host = host_with_hello().await;
    host.manager.unregister("vidhub-plugin-hello").await.unwrap();

    let response = get(&host, "/plugins/hello/router/ping").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_css_and_translations() {
    let host = host_with_hello().await;

    let css = get(&host, "/plugins/global.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert!(body_text(css).await.contains(".hello{}"));

    let translations = get(&host, "/plugins/translations/fr-FR.json").await;
    let body: Value = serde_json::from_str(&body_text(translations).await).unwrap();
    assert_eq!(body["vidhub-plugin-hello"]["Hello"], json!("Bonjour"));

    let none = get(&host, "/plugins/translations/de-DE.json").await;
    assert_eq!(body_text(none).await, "{}");
}

#[tokio::test]
async fn test_registered_and_static_files() {
    let host = host_with_hello().await;

    let registered = get(&host, "/plugins/registered").await;
    let body: Value = serde_json::from_str(&body_text(registered).await).unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["npmName"], json!("vidhub-plugin-hello"));

    let logo = get(&host, "/plugins/hello/1.0.0/static/images/logo.svg").await;
    assert_eq!(logo.status(), StatusCode::OK);
    assert_eq!(body_text(logo).await, "<svg/>");

    let unknown_alias = get(&host, "/plugins/hello/1.0.0/static/fonts/a.woff").await;
    assert_eq!(unknown_alias.status(), StatusCode::NOT_FOUND);
}
