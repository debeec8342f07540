use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::fold_case;
use crate::models::Actor;
use crate::services::filter_query::{escape_like, Pagination};

#[derive(Debug, Serialize)]
pub struct ActorPage {
    pub count: i64,
    pub page: u32,
    pub limit: u32,
    pub data: Vec<Actor>,
}

/// A show the actor appears in, with the role they play there
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ActorShow {
    pub show_id: i64,
    pub name: String,
    pub character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ActorShows {
    pub actor: String,
    pub count: usize,
    pub shows: Vec<ActorShow>,
}

/// Page through actors, optionally narrowed by a case-insensitive name fragment
pub async fn list(
    pool: &SqlitePool,
    name: Option<&str>,
    pagination: Pagination,
) -> Result<ActorPage, sqlx::Error> {
    let pattern = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!("%{}%", escape_like(&fold_case(n))));

    // NULL pattern disables the name condition
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM actors WHERE ? IS NULL OR name_folded LIKE ? ESCAPE '\\'",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let data: Vec<Actor> = sqlx::query_as(
        r#"
        SELECT actor_id, name, profile_url
        FROM actors
        WHERE ? IS NULL OR name_folded LIKE ? ESCAPE '\'
        ORDER BY actor_id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(pagination.limit as i64)
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    Ok(ActorPage {
        count,
        page: pagination.page,
        limit: pagination.limit,
        data,
    })
}

pub async fn get(pool: &SqlitePool, actor_id: i64) -> Result<Option<Actor>, sqlx::Error> {
    sqlx::query_as("SELECT actor_id, name, profile_url FROM actors WHERE actor_id = ?")
        .bind(actor_id)
        .fetch_optional(pool)
        .await
}

/// Every show the actor plays in, alphabetically. `None` if the actor does not exist.
pub async fn shows(pool: &SqlitePool, actor_id: i64) -> Result<Option<ActorShows>, sqlx::Error> {
    let Some(actor) = get(pool, actor_id).await? else {
        return Ok(None);
    };

    let shows: Vec<ActorShow> = sqlx::query_as(
        r#"
        SELECT s.show_id, s.name, c.name AS character, NULL AS tmdb_rating
        FROM tv_show s
        JOIN characters c ON c.show_id = s.show_id
        WHERE c.actor_id = ?
        ORDER BY s.name, s.show_id
        "#,
    )
    .bind(actor_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ActorShows {
        actor: actor.name,
        count: shows.len(),
        shows,
    }))
}

/// The actor's best rated shows, highest first
pub async fn top_rated_shows(
    pool: &SqlitePool,
    actor_id: i64,
    count: u32,
) -> Result<Option<ActorShows>, sqlx::Error> {
    let Some(actor) = get(pool, actor_id).await? else {
        return Ok(None);
    };

    let shows: Vec<ActorShow> = sqlx::query_as(
        r#"
        SELECT s.show_id, s.name, c.name AS character, s.tmdb_rating
        FROM tv_show s
        JOIN characters c ON c.show_id = s.show_id
        WHERE c.actor_id = ? AND s.tmdb_rating IS NOT NULL
        ORDER BY s.tmdb_rating DESC, s.show_id
        LIMIT ?
        "#,
    )
    .bind(actor_id)
    .bind(count as i64)
    .fetch_all(pool)
    .await?;

    Ok(Some(ActorShows {
        actor: actor.name,
        count: shows.len(),
        shows,
    }))
}
