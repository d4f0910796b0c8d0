use axum::{extract::State, routing::get, Json, Router};

use super::ActionResponse;
use crate::error::Result;
use crate::models::{ServiceSelection, StackConfig};
use crate::state::AppState;

/// Create configuration routes
pub fn config_routes(state: AppState) -> Router {
    Router::new()
        .route("/config", get(get_config).post(save_config))
        .route("/services", get(get_services).post(save_services))
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Get the stack configuration
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Config",
    responses(
        (status = 200, body = StackConfig)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> Result<Json<StackConfig>> {
    Ok(Json(state.store.load_config()?))
}

/// Replace the stack configuration.
///
/// `installation_status` in the body is ignored; the stored value is kept.
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "Config",
    request_body = StackConfig,
    responses(
        (status = 200, body = ActionResponse),
        (status = 400, description = "Invalid configuration")
    )
)]
pub async fn save_config(
    State(state): State<AppState>,
    Json(config): Json<StackConfig>,
) -> Result<Json<ActionResponse>> {
    state.store.replace_config(config)?;
    tracing::info!("Configuration updated");
    Ok(Json(ActionResponse::success()))
}

/// Get the service selection
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Config",
    responses(
        (status = 200, body = ServiceSelection)
    )
)]
pub async fn get_services(State(state): State<AppState>) -> Result<Json<ServiceSelection>> {
    Ok(Json(state.store.load_services()?))
}

/// Replace the service selection
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Config",
    request_body = ServiceSelection,
    responses(
        (status = 200, body = ActionResponse)
    )
)]
pub async fn save_services(
    State(state): State<AppState>,
    Json(services): Json<ServiceSelection>,
) -> Result<Json<ActionResponse>> {
    state.store.save_services(&services)?;
    tracing::info!("Service selection updated");
    Ok(Json(ActionResponse::success()))
}
