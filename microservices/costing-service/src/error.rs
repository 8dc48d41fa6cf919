//! REST error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::calculator::CalculationError;
use crate::store::StoreError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Invalid configuration: {0}")]
    MalformedInput(String),

    #[error("{0}")]
    Storage(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Storage(other),
        }
    }
}

impl From<CalculationError> for ApiError {
    fn from(err: CalculationError) -> Self {
        ApiError::MalformedInput(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::NotFound => json!({ "error": self.to_string() }),
            ApiError::MalformedInput(_) => {
                tracing::debug!("Rejected request: {}", self);
                json!({ "success": false, "message": self.to_string() })
            }
            ApiError::Storage(_) | ApiError::Internal(_) => {
                tracing::error!("Request failed: {:?}", self);
                json!({ "success": false, "message": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
