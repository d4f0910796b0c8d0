use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::store::StoreError;
use crate::services::supervisor::StartError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Store(StoreError::InstallInProgress) => (
                StatusCode::CONFLICT,
                StoreError::InstallInProgress.to_string(),
            ),
            AppError::Store(e @ StoreError::Invalid { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", e))
            }
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

impl From<StartError> for AppError {
    fn from(err: StartError) -> Self {
        match err {
            StartError::Store(e) => AppError::Store(e),
            StartError::ShuttingDown => {
                AppError::ServiceUnavailable("Server is shutting down".to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
