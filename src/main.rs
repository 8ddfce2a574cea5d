//! VidHub Server: extension host
//!
//! Loads configuration, boots the plugin host and serves extension routes.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use vidhub::http::{HostState, build_router};
use vidhub::logging::init_logging;
use vidhub_core::config::AppConfig;
use vidhub_core::error::AppError;
use vidhub_plugin::{FilePluginStore, ModuleLoader, PluginManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, the `VIDHUB_ENV` overlay
/// and `VIDHUB__*` variables, or from `VIDHUB_CONFIG` when set.
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("VIDHUB_CONFIG") {
        Ok(path) => AppConfig::load_from(&path),
        Err(_) => {
            let env = std::env::var("VIDHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting VidHub");

    // ── Step 1: Extension host ───────────────────────────────────
    let plugins = &config.plugins;
    tokio::fs::create_dir_all(plugins.directory_path()).await?;

    let store = FilePluginStore::open(Path::new(&plugins.store_path)).await?;
    let manager = PluginManager::builder(plugins)
        .store(Arc::new(store))
        .loader(module_loader(&config))
        .build()?;
    let manager = Arc::new(manager);

    if plugins.auto_load {
        manager.register_all_enabled().await?;
    } else {
        tracing::info!("Automatic extension loading disabled");
    }

    // ── Step 2: HTTP server ──────────────────────────────────────
    let app = build_router(HostState {
        manager: Arc::clone(&manager),
    });

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "VidHub server listening");
    manager
        .run_hook(
            "action:application.listening",
            serde_json::Value::Null,
            json!({ "address": addr }),
        )
        .await;

    // ── Step 3: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if tokio::time::timeout(config.server.shutdown_grace(), manager.unregister_all()).await.is_err() {
        tracing::warn!("Extensions did not unregister within the grace period");
    }

    tracing::info!("VidHub server shut down gracefully");
    Ok(())
}

#[cfg(feature = "dynamic")]
fn module_loader(config: &AppConfig) -> Arc<dyn ModuleLoader> {
    let shadow_dir = config.plugins.directory_path().join(".shadow");
    Arc::new(vidhub_plugin::DynamicModuleLoader::new(&shadow_dir))
}

#[cfg(not(feature = "dynamic"))]
fn module_loader(_config: &AppConfig) -> Arc<dyn ModuleLoader> {
    tracing::warn!("Built without dynamic loading; plugins with server code will fail to load");
    Arc::new(vidhub_plugin::StaticModuleLoader::new())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
