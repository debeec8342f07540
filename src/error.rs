//! HTTP error type shared by all handlers.
//!
//! Client-caused errors carry a message; server-side failures are logged and
//! answered with an error code only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::api_keys::ApiKeyError;
use crate::services::filter_query::SearchError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    ApiKey(#[from] ApiKeyError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn server_error(kind: &'static str, detail: &dyn std::fmt::Debug) -> (StatusCode, &'static str, Option<String>) {
    tracing::error!("{}: {:?}", kind, detail);
    (StatusCode::INTERNAL_SERVER_ERROR, kind, None)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Database(e) => server_error("database_error", e),
            AppError::Search(SearchError::QueryExecutionFailed(e)) => {
                server_error("database_error", e)
            }
            AppError::Search(e @ SearchError::InvalidFilterInput { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_filter", Some(e.to_string()))
            }
            AppError::ApiKey(e) => match e {
                ApiKeyError::Missing => {
                    (StatusCode::UNAUTHORIZED, "key_required", Some(e.to_string()))
                }
                ApiKeyError::InvalidFormat | ApiKeyError::Unknown => {
                    (StatusCode::UNAUTHORIZED, "key_invalid", Some(e.to_string()))
                }
                ApiKeyError::Revoked => {
                    (StatusCode::UNAUTHORIZED, "key_revoked", Some(e.to_string()))
                }
                ApiKeyError::InvalidRequest { .. } => {
                    (StatusCode::BAD_REQUEST, "bad_request", Some(e.to_string()))
                }
                ApiKeyError::Database(db) => server_error("database_error", db),
            },
            AppError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "not_found", Some(resource.clone()))
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
