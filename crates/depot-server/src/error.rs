use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type for error bodies on the object endpoints.
pub const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("object not found")]
    ObjectNotFound,

    #[error("store error: {0}")]
    Store(#[from] depot_store::StoreError),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ObjectNotFound => StatusCode::NOT_FOUND,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::NOT_FOUND {
            return error_response(status, "Not found");
        }
        tracing::error!(error = %self, "request failed");
        error_response(status, "Internal server error")
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON error body: `{"message": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Build an error response with the LFS media type.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::to_vec(&ErrorResponse {
        message: message.to_string(),
    })
    .unwrap_or_default();
    (status, [(CONTENT_TYPE, LFS_MEDIA_TYPE)], body).into_response()
}
