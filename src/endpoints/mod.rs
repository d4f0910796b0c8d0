pub mod config;
pub mod containers;
pub mod install;
pub mod status;
pub mod system;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::OpenApi;

use crate::config::CONFIG;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "PI-PVR control plane"),
    paths(
        config::get_config,
        config::save_config,
        config::get_services,
        config::save_services,
        status::get_status,
        install::start_install,
        install::get_logs,
        install::generate_compose,
        containers::restart_stack,
        containers::restart_container,
        containers::start_container,
        containers::stop_container,
        containers::container_logs,
        system::get_system_info,
        system::get_drives,
        system::get_catalog,
    ),
    tags(
        (name = "Config", description = "Stack configuration and service selection"),
        (name = "Install", description = "Installation runs and their transcript"),
        (name = "Containers", description = "Live container control"),
        (name = "System", description = "Host facts"),
    )
)]
pub struct ApiDoc;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/version", get(get_version))
        .route("/api/openapi.json", get(openapi_json))
        .nest("/api", api_routes(state))
}

/// API routes under /api/*
fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(config::config_routes(state.clone()))
        .merge(status::status_routes(state.clone()))
        .merge(install::install_routes(state.clone()))
        .merge(containers::containers_routes(state.clone()))
        .merge(system::system_routes(state))
}

/// `{status: success}` or `{status: error, message}` reply used by mutating routes
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ActionResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": CONFIG.version,
        "commit_hash": CONFIG.commit_hash,
        "build_time": CONFIG.build_time,
        "backend": "rust"
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
