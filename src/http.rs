//! Routes served on behalf of registered extensions.
//!
//! - `/plugins/global.css`: the aggregated plugin CSS
//! - `/plugins/translations/{locale}.json`: translations of every extension
//! - `/plugins/registered`: summaries of registered extensions
//! - `/plugins/{name}[/{version}]/router/*`: a plugin's own sub-router
//! - `/{plugins|themes}/{name}/{version}/static/{alias}/*`: static directories
//! - `/{plugins|themes}/{name}/{version}/client-scripts/*`: declared client scripts

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use vidhub_core::error::{AppError, ErrorKind};
use vidhub_plugin::{PluginManager, PluginType, RegisteredPlugin, RegisteredPluginInfo};

/// Shared state of the host routes.
#[derive(Debug, Clone)]
pub struct HostState {
    /// The extension host.
    pub manager: Arc<PluginManager>,
}

/// Error body returned by host routes.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Maps `AppError` to an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: self.0.kind.to_string(),
            message: self.0.message,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the router of every extension-facing route.
pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/plugins/global.css", get(global_css))
        .route("/plugins/translations/{locale}", get(translations))
        .route("/plugins/registered", get(registered))
        .route("/plugins/{name}/router/{*rest}", any(plugin_router))
        .route(
            "/plugins/{name}/{version}/router/{*rest}",
            any(versioned_plugin_router),
        )
        .route(
            "/plugins/{name}/{version}/static/{alias}/{*path}",
            get(plugin_static),
        )
        .route(
            "/themes/{name}/{version}/static/{alias}/{*path}",
            get(theme_static),
        )
        .route(
            "/plugins/{name}/{version}/client-scripts/{*path}",
            get(plugin_client_script),
        )
        .route(
            "/themes/{name}/{version}/client-scripts/{*path}",
            get(theme_client_script),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn global_css(State(state): State<HostState>) -> ApiResult<Response> {
    let css = state.manager.global_css().await?;
    Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response())
}

async fn translations(
    State(state): State<HostState>,
    Path(locale): Path<String>,
) -> impl IntoResponse {
    let locale = locale.strip_suffix(".json").unwrap_or(&locale);
    Json(state.manager.get_translations(locale).await)
}

async fn registered(State(state): State<HostState>) -> Json<Vec<RegisteredPluginInfo>> {
    let mut plugins = state.manager.get_registered_plugins().await;
    plugins.extend(state.manager.get_registered_themes().await);
    Json(plugins.iter().map(|p| RegisteredPluginInfo::from(p.as_ref())).collect())
}

async fn plugin_router(
    State(state): State<HostState>,
    Path((name, rest)): Path<(String, String)>,
    request: Request,
) -> ApiResult<Response> {
    forward(&state, &name, None, &rest, request).await
}

async fn versioned_plugin_router(
    State(state): State<HostState>,
    Path((name, version, rest)): Path<(String, String, String)>,
    request: Request,
) -> ApiResult<Response> {
    forward(&state, &name, Some(&version), &rest, request).await
}

async fn forward(
    state: &HostState,
    name: &str,
    version: Option<&str>,
    rest: &str,
    mut request: Request,
) -> ApiResult<Response> {
    let plugin = find(state, PluginType::Plugin, name, version).await?;
    let router = state
        .manager
        .get_router(&plugin.npm_name)
        .await
        .ok_or_else(|| AppError::not_found(format!("Plugin '{name}' has no router")))?;

    *request.uri_mut() = rebase(rest, request.uri())?;
    let response = router.router().await.oneshot(request).await;
    Ok(match response {
        Ok(response) => response,
        Err(never) => match never {},
    })
}

async fn plugin_static(
    State(state): State<HostState>,
    Path((name, version, alias, path)): Path<(String, String, String, String)>,
    request: Request,
) -> ApiResult<Response> {
    serve_static(&state, PluginType::Plugin, (name, version, alias, path), request).await
}

async fn theme_static(
    State(state): State<HostState>,
    Path((name, version, alias, path)): Path<(String, String, String, String)>,
    request: Request,
) -> ApiResult<Response> {
    serve_static(&state, PluginType::Theme, (name, version, alias, path), request).await
}

async fn serve_static(
    state: &HostState,
    plugin_type: PluginType,
    (name, version, alias, path): (String, String, String, String),
    mut request: Request,
) -> ApiResult<Response> {
    let plugin = find(state, plugin_type, &name, Some(&version)).await?;
    let dir = plugin
        .static_dirs
        .get(&alias)
        .ok_or_else(|| AppError::not_found(format!("Unknown static directory '{alias}'")))?;

    *request.uri_mut() = rebase(&path, request.uri())?;
    let response = ServeDir::new(plugin.path.join(dir)).oneshot(request).await;
    Ok(match response {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    })
}

async fn plugin_client_script(
    State(state): State<HostState>,
    Path((name, version, path)): Path<(String, String, String)>,
    request: Request,
) -> ApiResult<Response> {
    serve_client_script(&state, PluginType::Plugin, (name, version, path), request).await
}

async fn theme_client_script(
    State(state): State<HostState>,
    Path((name, version, path)): Path<(String, String, String)>,
    request: Request,
) -> ApiResult<Response> {
    serve_client_script(&state, PluginType::Theme, (name, version, path), request).await
}

async fn serve_client_script(
    state: &HostState,
    plugin_type: PluginType,
    (name, version, path): (String, String, String),
    request: Request,
) -> ApiResult<Response> {
    let plugin = find(state, plugin_type, &name, Some(&version)).await?;
    let declared = plugin
        .client_scripts
        .keys()
        .any(|script| script.trim_start_matches("./") == path);
    if !declared {
        return Err(AppError::not_found(format!("Unknown client script '{path}'")).into());
    }

    let response = ServeFile::new(plugin.path.join(&path)).oneshot(request).await;
    Ok(match response {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    })
}

async fn find(
    state: &HostState,
    plugin_type: PluginType,
    name: &str,
    version: Option<&str>,
) -> ApiResult<Arc<RegisteredPlugin>> {
    let plugin = match plugin_type {
        PluginType::Plugin => state.manager.get_registered_plugin_by_short_name(name).await,
        PluginType::Theme => state.manager.get_registered_theme_by_short_name(name).await,
    };

    match plugin {
        Some(p) if version.is_none_or(|v| v == p.version) => Ok(p),
        Some(p) => Err(AppError::new(
            ErrorKind::NotFound,
            format!("{plugin_type} '{name}' is registered in version {}", p.version),
        )
        .into()),
        None => Err(AppError::not_found(format!("No {plugin_type} named '{name}'")).into()),
    }
}

/// `/{rest}` plus the original query string.
fn rebase(rest: &str, uri: &Uri) -> ApiResult<Uri> {
    let target = match uri.query() {
        Some(query) => format!("/{rest}?{query}"),
        None => format!("/{rest}"),
    };
    target
        .parse()
        .map_err(|_| ApiError(AppError::validation(format!("Invalid path '{rest}'"))))
}
