//! Direct pass-through to the container runtime.
//!
//! Runtime failures are reported in the body as `{status: "error", message}`
//! with a 200, matching what the web UI expects.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ActionResponse;
use crate::error::{AppError, Result};
use crate::state::AppState;

const DEFAULT_LOG_LINES: u32 = 100;
const MAX_LOG_LINES: u32 = 10_000;

/// Create container control routes
pub fn containers_routes(state: AppState) -> Router {
    Router::new()
        .route("/restart", post(restart_stack))
        .route("/restart/{name}", post(restart_container))
        .route("/start/{name}", post(start_container))
        .route("/stop/{name}", post(stop_container))
        .route("/logs/{container}", get(container_logs))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LogsQuery {
    /// Number of trailing lines, default 100
    pub lines: Option<u32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContainerLogsResponse {
    pub content: String,
    pub service: String,
    pub lines: u32,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Restart every service of the deployed manifest
#[utoipa::path(
    post,
    path = "/api/restart",
    tag = "Containers",
    responses(
        (status = 200, body = ActionResponse)
    )
)]
pub async fn restart_stack(State(state): State<AppState>) -> Json<ActionResponse> {
    let Some(manifest) = state.paths.locate_manifest() else {
        return Json(ActionResponse::error(format!(
            "Docker Compose file not found at {}",
            state.paths.manifest().display()
        )));
    };
    action_result(state.docker.compose_restart(&manifest).await)
}

/// Restart one container
#[utoipa::path(
    post,
    path = "/api/restart/{name}",
    tag = "Containers",
    params(("name" = String, Path, description = "Container name")),
    responses(
        (status = 200, body = ActionResponse),
        (status = 400, description = "Invalid container name")
    )
)]
pub async fn restart_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>> {
    validate_container_name(&name)?;
    Ok(action_result(state.docker.restart(&name).await))
}

/// Start one container
#[utoipa::path(
    post,
    path = "/api/start/{name}",
    tag = "Containers",
    params(("name" = String, Path, description = "Container name")),
    responses(
        (status = 200, body = ActionResponse),
        (status = 400, description = "Invalid container name")
    )
)]
pub async fn start_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>> {
    validate_container_name(&name)?;
    Ok(action_result(state.docker.start(&name).await))
}

/// Stop one container
#[utoipa::path(
    post,
    path = "/api/stop/{name}",
    tag = "Containers",
    params(("name" = String, Path, description = "Container name")),
    responses(
        (status = 200, body = ActionResponse),
        (status = 400, description = "Invalid container name")
    )
)]
pub async fn stop_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>> {
    validate_container_name(&name)?;
    Ok(action_result(state.docker.stop(&name).await))
}

/// Tail a container's output
#[utoipa::path(
    get,
    path = "/api/logs/{container}",
    tag = "Containers",
    params(
        ("container" = String, Path, description = "Container name"),
        LogsQuery
    ),
    responses(
        (status = 200, body = ContainerLogsResponse),
        (status = 400, description = "Invalid container name"),
        (status = 404, description = "No such container")
    )
)]
pub async fn container_logs(
    State(state): State<AppState>,
    Path(container): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ContainerLogsResponse>> {
    validate_container_name(&container)?;
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES).clamp(1, MAX_LOG_LINES);

    let content = state.docker.logs(&container, lines).await.map_err(|e| {
        let message = format!("{:#}", e);
        if message.contains("No such container") {
            AppError::NotFound(format!("Container not found: {}", container))
        } else {
            AppError::ServiceUnavailable(message)
        }
    })?;

    Ok(Json(ContainerLogsResponse {
        content,
        service: container,
        lines,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn action_result(result: anyhow::Result<()>) -> Json<ActionResponse> {
    match result {
        Ok(()) => Json(ActionResponse::success()),
        Err(e) => {
            tracing::warn!("Container action failed: {:#}", e);
            Json(ActionResponse::error(format!("{:#}", e)))
        }
    }
}

/// Names must look like `[A-Za-z0-9][A-Za-z0-9_.-]*`
fn validate_container_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid container name: {}", name)))
    }
}
