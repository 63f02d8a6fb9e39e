use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use gaggle_store::error::{ErrorKind, StoreError};

/// Handler-level error. Domain failures arrive via the store's two-way
/// input/access split; everything else is an internal error that hides
/// its details from the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Access(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn input(message: impl Into<String>) -> Self {
        ApiError::Input(message.into())
    }

    pub fn access(message: impl Into<String>) -> Self {
        ApiError::Access(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            ErrorKind::Input => ApiError::Input(err.to_string()),
            ErrorKind::Access => ApiError::Access(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, name, message) = match self {
            ApiError::Input(message) => (StatusCode::BAD_REQUEST, "InputError", message),
            ApiError::Access(message) => (StatusCode::FORBIDDEN, "AccessError", message),
            ApiError::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "System Error",
                    "internal server error".to_string(),
                )
            }
        };
        let body = Json(serde_json::json!({
            "code": status.as_u16(),
            "name": name,
            "message": message,
        }));
        (status, body).into_response()
    }
}
