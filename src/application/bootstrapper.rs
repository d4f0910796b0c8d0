//! Application bootstrapper
//!
//! Handles all initialization and setup for the PI-PVR control plane.

use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, CONFIG};
use crate::endpoints;
use crate::services::{
    BuiltinRenderer, CommandRunner, ConfigStore, InstallLog, ManifestRenderer, RunId, RunJournal,
    ScriptRenderer, SystemRunner,
};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting PI-PVR control plane v{}", env!("CARGO_PKG_VERSION"));

    let state = init_services()?;
    let app = create_app(state.clone());

    serve(app, state).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pipvr={},tower_http=info", CONFIG.log_level).into());

    match CONFIG.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init(),
    }
}

/// Initialize all application services
fn init_services() -> anyhow::Result<AppState> {
    let paths = CONFIG.paths.clone();
    std::fs::create_dir_all(&paths.config_dir)?;
    std::fs::create_dir_all(&paths.logs_dir)?;

    let store = ConfigStore::file(&paths);
    store.seed_defaults()?;

    if store.recover_interrupted()? {
        tracing::warn!("Found an installation left in progress by a previous process");
        RunJournal::new(InstallLog::new(paths.installation_log()), RunId::new())
            .error("Previous installation was interrupted; marked as failed");
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    let renderer = init_renderer(runner.clone());

    Ok(AppState::new(paths, store, runner, renderer))
}

/// Pick the manifest renderer
fn init_renderer(runner: Arc<dyn CommandRunner>) -> Arc<dyn ManifestRenderer> {
    let install = &CONFIG.install;
    if install.use_script_renderer() {
        tracing::info!(
            "Using compose generator script at {}",
            install.compose_generator.display()
        );
        Arc::new(ScriptRenderer::new(
            runner,
            install.compose_generator.clone(),
            CONFIG.paths.base_dir.clone(),
        ))
    } else {
        tracing::info!("Using built-in compose renderer");
        Arc::new(BuiltinRenderer::new(CONFIG.paths.manifest()))
    }
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    let static_dir = state.paths.static_dir.clone();
    let index = static_dir.join("index.html");

    let serve_dir = ServeDir::new(&static_dir)
        .not_found_service(ServeDir::new(&static_dir).fallback(ServeFile::new(index)));

    endpoints::create_router(state)
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = CONFIG
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the HTTP server
async fn serve(app: Router, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, waiting for installation task");
    state.supervisor.shutdown(CONFIG.install.shutdown_grace).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
