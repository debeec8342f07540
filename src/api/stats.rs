use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::stats::{self, StatsDimension, StatsEntry};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/:dimension", get(get_stats))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(dimension): Path<String>,
) -> Result<Json<Vec<StatsEntry>>> {
    let dimension: StatsDimension = dimension
        .parse()
        .map_err(|_| AppError::NotFound(format!("No statistics for '{}'", dimension)))?;

    Ok(Json(stats::aggregate(&state.db, dimension).await?))
}
