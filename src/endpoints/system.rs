use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::models::{DrivesResponse, SystemInfo};
use crate::services::catalog::{self, AppCategory, AppDefinition};
use crate::state::AppState;

/// Create host information routes
pub fn system_routes(state: AppState) -> Router {
    Router::new()
        .route("/system", get(get_system_info))
        .route("/drives", get(get_drives))
        .route("/catalog", get(get_catalog))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CatalogApp {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub image: String,
    pub category: AppCategory,
    /// Published host ports
    pub ports: Vec<u16>,
}

impl From<&AppDefinition> for CatalogApp {
    fn from(app: &AppDefinition) -> Self {
        Self {
            name: app.name.to_string(),
            display_name: app.display_name.to_string(),
            description: app.description.to_string(),
            image: app.image.to_string(),
            category: app.category,
            ports: app.ports.iter().map(|(host, _)| *host).collect(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CatalogResponse {
    pub apps: Vec<CatalogApp>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Host facts for the dashboard
#[utoipa::path(
    get,
    path = "/api/system",
    tag = "System",
    responses(
        (status = 200, body = SystemInfo)
    )
)]
pub async fn get_system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(state.system.inspect().await)
}

/// Mountable partitions; empty when detection fails
#[utoipa::path(
    get,
    path = "/api/drives",
    tag = "System",
    responses(
        (status = 200, body = DrivesResponse)
    )
)]
pub async fn get_drives(State(state): State<AppState>) -> Json<DrivesResponse> {
    Json(DrivesResponse {
        drives: state.system.drives().await,
    })
}

/// Every app the stack can deploy
#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "System",
    responses(
        (status = 200, body = CatalogResponse)
    )
)]
pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        apps: catalog::APPS.iter().map(CatalogApp::from).collect(),
    })
}
