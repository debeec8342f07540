use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::api_keys;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without a valid, active key. Each accepted request is
/// counted against its key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.api.require_api_key {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let key = match api_keys::authenticate(&state.db, presented.as_deref()).await {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
            return Err(e.into());
        }
    };

    tracing::trace!("Request authenticated with key '{}'", key.name);
    Ok(next.run(request).await)
}
