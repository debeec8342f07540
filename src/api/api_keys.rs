use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::services::api_keys::{self, IssuedKey};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(create_api_key))
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub message: &'static str,
    pub data: IssuedKey,
}

async fn create_api_key(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    let issued = api_keys::issue(&state.db, &request.name, request.email.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyResponse {
            message: "API key generated - save this key, it won't be shown again",
            data: issued,
        }),
    ))
}
