use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::models::StatusReport;
use crate::state::AppState;

pub fn status_routes(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .with_state(state)
}

/// Installation status next to the live container list.
///
/// A failed container query shows up as the `error` entry, never as a failed request.
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Install",
    responses(
        (status = 200, body = StatusReport)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusReport>> {
    let report = state
        .status
        .report(state.supervisor.active_run())
        .await?;
    Ok(Json(report))
}
