use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::Result;
use crate::services::renderer::RenderResult;
use crate::state::AppState;

/// Create installation routes
pub fn install_routes(state: AppState) -> Router {
    Router::new()
        .route("/install", post(start_install))
        .route("/logs", get(get_logs))
        .route("/generate-compose", post(generate_compose))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstallStarted {
    pub status: String,
    pub message: String,
    pub run_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LogsResponse {
    pub logs: String,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Start an installation run in the background
#[utoipa::path(
    post,
    path = "/api/install",
    tag = "Install",
    responses(
        (status = 200, body = InstallStarted),
        (status = 409, description = "Installation already in progress")
    )
)]
pub async fn start_install(State(state): State<AppState>) -> Result<Json<InstallStarted>> {
    let run = state.supervisor.start()?;
    Ok(Json(InstallStarted {
        status: "started".to_string(),
        message: "Installation started".to_string(),
        run_id: run.to_string(),
    }))
}

/// Full installation transcript
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Install",
    responses(
        (status = 200, body = LogsResponse)
    )
)]
pub async fn get_logs(State(state): State<AppState>) -> Result<Json<LogsResponse>> {
    let logs = state.install_log.read_all()?;
    Ok(Json(LogsResponse { logs }))
}

/// Render the manifest from the stored documents without installing anything
#[utoipa::path(
    post,
    path = "/api/generate-compose",
    tag = "Install",
    responses(
        (status = 200, body = RenderResult)
    )
)]
pub async fn generate_compose(State(state): State<AppState>) -> Result<Json<RenderResult>> {
    let config = state.store.load_config()?;
    let services = state.store.load_services()?;
    let result = state.renderer.render(&config, &services).await;
    if !result.success {
        tracing::warn!(
            "Manifest generation failed: {}",
            result.error.as_deref().unwrap_or_default()
        );
    }
    Ok(Json(result))
}
