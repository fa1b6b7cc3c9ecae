use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use models::ApiResponse;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Store failure: {0}")]
    StoreFailure(#[from] rusqlite::Error),

    #[error("Store task failed: {0}")]
    TaskFailure(#[from] JoinError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationFailure(message.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected json body: {}", rejection.body_text());
        AppError::MalformedPayload
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        warn!("Rejected form body: {}", rejection.body_text());
        AppError::MalformedPayload
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ValidationFailure { .. } => StatusCode::BAD_REQUEST,
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::StoreFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TaskFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AppError::StoreFailure(e) => error!("Store failure: {e}"),
            AppError::TaskFailure(e) => error!("Store task failed: {e}"),
            _ => {}
        }

        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
