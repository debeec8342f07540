use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::error::Result;
use crate::services::genres::{self, GenreCount};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_genres))
}

async fn list_genres(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GenreCount>>> {
    Ok(Json(genres::list(&state.db).await?))
}
