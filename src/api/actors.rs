use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{pagination, parse_id, present};
use crate::error::{AppError, Result};
use crate::models::Actor;
use crate::services::actors::{self, ActorPage, ActorShows};
use crate::services::filter_query::parse_integer;
use crate::AppState;

const MAX_NAME_QUERY: usize = 100;
const DEFAULT_RATING_COUNT: i64 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_actors))
        .route("/:id", get(get_actor))
        .route("/:id/shows", get(get_actor_shows))
        .route("/:id/ratings", get(get_actor_ratings))
}

#[derive(Debug, Default, Deserialize)]
pub struct ActorsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingsQuery {
    pub count: Option<String>,
}

async fn list_actors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActorsQuery>,
) -> Result<Json<ActorPage>> {
    if let Some(ref name) = query.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name parameter cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_QUERY {
            return Err(AppError::BadRequest(
                "Name parameter too long (max 100 characters)".to_string(),
            ));
        }
    }

    let pagination = pagination(&state, query.page.as_deref(), query.limit.as_deref())?;
    Ok(Json(
        actors::list(&state.db, query.name.as_deref(), pagination).await?,
    ))
}

async fn get_actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Actor>> {
    let actor_id = parse_id(&id, "Actor")?;
    actors::get(&state.db, actor_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Actor not found".to_string()))
}

async fn get_actor_shows(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActorShows>> {
    let actor_id = parse_id(&id, "Actor")?;
    actors::shows(&state.db, actor_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Actor not found".to_string()))
}

async fn get_actor_ratings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RatingsQuery>,
) -> Result<Json<ActorShows>> {
    let actor_id = parse_id(&id, "Actor")?;

    let count = match present(query.count.as_deref()) {
        Some(raw) => parse_integer("count", raw)?,
        None => DEFAULT_RATING_COUNT,
    };
    if !(1..=100).contains(&count) {
        return Err(AppError::BadRequest(
            "count must be between 1 and 100".to_string(),
        ));
    }

    actors::top_rated_shows(&state.db, actor_id, count as u32)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Actor not found".to_string()))
}
