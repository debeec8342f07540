use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Public routes: service info and health. Never behind the key check.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_service_info).head(get_service_info))
        .route("/health", get(get_health))
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub api_key_required: bool,
    pub endpoints: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
}

async fn get_service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        api_key_required: state.config.api.require_api_key,
        endpoints: vec!["/shows", "/actors", "/genres", "/stats", "/api-key"],
    })
}

async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(Health {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}
