use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{pagination, parse_id, present};
use crate::error::{AppError, Result};
use crate::models::ShowSummary;
use crate::services::filter_query::{
    parse_date, parse_integer, parse_rating, ShowFilters, MAX_PAGE_SIZE,
};
use crate::services::shows::{self, ShowDetail, ShowRanking, ShowSearchResponse};
use crate::AppState;

const RANKED_DEFAULT: u32 = 50;
const FALLBACK_COUNT: u32 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_shows))
        .route("/filter", get(filter_shows))
        .route("/random", get(random_shows))
        .route("/longest-running", get(longest_running))
        .route("/popular", get(popular))
        .route("/top-rated", get(top_rated))
        .route("/:id", get(get_show))
        .route("/:id/summary", get(get_show_summary))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Raw filter query. Numbers and dates arrive as text so bad values
/// produce a field-specific error instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowFilterQuery {
    pub actors: Option<String>,
    pub genres: Option<String>,
    pub network: Option<String>,
    pub studios: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "min_rating")]
    pub min_rating: Option<String>,
    #[serde(alias = "max_rating")]
    pub max_rating: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
    pub country: Option<String>,
    pub creators: Option<String>,
    pub name: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ShowFilterQuery {
    fn filters(&self) -> Result<ShowFilters> {
        let min_rating = present(self.min_rating.as_deref())
            .map(|r| parse_rating("minRating", r))
            .transpose()?;
        let max_rating = present(self.max_rating.as_deref())
            .map(|r| parse_rating("maxRating", r))
            .transpose()?;
        let start_date = present(self.start_date.as_deref())
            .map(|d| parse_date("startDate", d))
            .transpose()?;
        let end_date = present(self.end_date.as_deref())
            .map(|d| parse_date("endDate", d))
            .transpose()?;

        Ok(ShowFilters {
            actors: self.actors.clone(),
            genres: self.genres.clone(),
            network: self.network.clone(),
            studios: self.studios.clone(),
            status: self.status.clone(),
            min_rating,
            max_rating,
            start_date,
            end_date,
            country: self.country.clone(),
            creators: self.creators.clone(),
            name: self.name.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub count: Option<String>,
    pub limit: Option<String>,
}

/// Absent means `default`; anything outside 1..=100 falls back to 10
fn bounded_count(raw: Option<&str>, field: &'static str, default: u32) -> Result<u32> {
    match present(raw) {
        None => Ok(default),
        Some(raw) => {
            let value = parse_integer(field, raw)?;
            Ok(if (1..=100).contains(&value) {
                value as u32
            } else {
                FALLBACK_COUNT
            })
        }
    }
}

/// Ranked lists cap the limit at 100. Absent or zero means 50, a negative
/// limit falls back to 10.
fn ranked_limit(raw: Option<&str>) -> Result<u32> {
    let Some(raw) = present(raw) else {
        return Ok(RANKED_DEFAULT);
    };
    Ok(match parse_integer("limit", raw)? {
        0 => RANKED_DEFAULT,
        value if value < 0 => FALLBACK_COUNT,
        value => value.min(MAX_PAGE_SIZE as i64) as u32,
    })
}

async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ShowSearchResponse>> {
    let pagination = pagination(&state, query.page.as_deref(), query.limit.as_deref())?;
    Ok(Json(shows::list(&state.db, pagination).await?))
}

async fn filter_shows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShowFilterQuery>,
) -> Result<Json<ShowSearchResponse>> {
    let filters = query.filters()?;
    let pagination = pagination(&state, query.page.as_deref(), query.limit.as_deref())?;

    let response = shows::search(&state.db, &filters, pagination).await?;
    tracing::debug!(
        "Filter search matched {} shows (page {}, limit {})",
        response.count,
        response.page,
        response.limit
    );
    Ok(Json(response))
}

async fn random_shows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<ShowSummary>>> {
    let count = bounded_count(query.count.as_deref(), "count", FALLBACK_COUNT)?;
    Ok(Json(shows::random(&state.db, count).await?))
}

async fn ranked(state: &AppState, query: &CountQuery, ranking: ShowRanking) -> Result<Json<Vec<ShowSummary>>> {
    let limit = ranked_limit(query.limit.as_deref())?;
    Ok(Json(shows::ranked(&state.db, ranking, limit).await?))
}

async fn longest_running(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<ShowSummary>>> {
    ranked(&state, &query, ShowRanking::LongestRunning).await
}

async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<ShowSummary>>> {
    ranked(&state, &query, ShowRanking::Popular).await
}

async fn top_rated(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<ShowSummary>>> {
    ranked(&state, &query, ShowRanking::TopRated).await
}

async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShowDetail>> {
    let show_id = parse_id(&id, "Show")?;
    shows::detail(&state.db, show_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Show {} not found", show_id)))
}

async fn get_show_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShowSummary>> {
    let show_id = parse_id(&id, "Show")?;
    shows::summary(&state.db, show_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Show {} not found", show_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get_json, open_app};
    use axum::http::StatusCode;

    fn ids(body: &serde_json::Value) -> Vec<i64> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["show_id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_filter_endpoint() {
        let (app, _) = open_app().await;
        let (status, body) = get_json(
            &app,
            "/shows/filter?genres=Drama&minRating=7&startDate=2020-01-01",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 7]);
        assert_eq!(body["count"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 50);
        assert_eq!(body["filters"]["genres"], "Drama");
        assert_eq!(body["filters"]["minRating"], 7.0);
        assert!(body["filters"].get("actors").is_none());
    }

    #[tokio::test]
    async fn test_filter_accepts_snake_case_and_encoded_lists() {
        let (app, _) = open_app().await;
        let (status, body) = get_json(
            &app,
            "/shows/filter?actors=Ana%20Garibaldi,Daniel%20Dae%20Kim&min_rating=7.5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_filter_rejects_bad_values() {
        let (app, _) = open_app().await;

        for uri in [
            "/shows/filter?minRating=high",
            "/shows/filter?maxRating=12",
            "/shows/filter?startDate=01/02/2020",
            "/shows/filter?page=two",
            "/shows/filter?limit=1.5",
        ] {
            let (status, body) = get_json(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "invalid_filter");
        }
    }

    #[tokio::test]
    async fn test_listing_clamps_limit() {
        let (app, _) = open_app().await;

        let (status, body) = get_json(&app, "/shows?page=2&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![6, 7, 8]);
        assert_eq!(body["count"], 8);

        let (_, body) = get_json(&app, "/shows?limit=1000&page=0").await;
        assert_eq!(body["limit"], 100);
        assert_eq!(body["page"], 1);

        let (_, body) = get_json(&app, "/shows?page=10").await;
        assert_eq!(body["count"], 8);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_ranked_lists() {
        let (app, _) = open_app().await;

        let (_, body) = get_json(&app, "/shows/top-rated?limit=3").await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["The Office", "Dark", "Severance"]);

        // capped at 100, which covers every show with a popularity
        let (status, body) = get_json(&app, "/shows/popular?limit=500").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);

        let (status, body) = get_json(&app, "/shows/popular?limit=-3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);

        let (status, body) = get_json(&app, "/shows/top-rated?limit=many").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_filter");

        let (_, body) = get_json(&app, "/shows/longest-running?limit=1").await;
        assert_eq!(body[0]["name"], "Hawaii Five-0");

        let (_, body) = get_json(&app, "/shows/random?count=0").await;
        assert_eq!(body.as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_show_detail() {
        let (app, _) = open_app().await;

        let (status, body) = get_json(&app, "/shows/4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Lost");
        assert_eq!(
            body["creators"],
            serde_json::json!(["J. J. Abrams", "Jeffrey Lieber", "Damon Lindelof"])
        );
        assert_eq!(body["network"]["name"], "ABC");
        assert_eq!(body["actors"][1]["character"], "Jin-Soo Kwon");

        let (status, body) = get_json(&app, "/shows/4/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["episodes"], 121);

        let (status, body) = get_json(&app, "/shows/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, body) = get_json(&app, "/shows/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[test]
    fn test_bounded_count() {
        assert_eq!(bounded_count(None, "limit", 50).unwrap(), 50);
        assert_eq!(bounded_count(Some("25"), "limit", 50).unwrap(), 25);
        assert_eq!(bounded_count(Some("0"), "limit", 50).unwrap(), 10);
        assert_eq!(bounded_count(Some("101"), "limit", 50).unwrap(), 10);
        assert!(bounded_count(Some("ten"), "limit", 50).is_err());
    }

    #[test]
    fn test_ranked_limit() {
        assert_eq!(ranked_limit(None).unwrap(), 50);
        assert_eq!(ranked_limit(Some(" ")).unwrap(), 50);
        assert_eq!(ranked_limit(Some("25")).unwrap(), 25);
        assert_eq!(ranked_limit(Some("100")).unwrap(), 100);
        assert_eq!(ranked_limit(Some("500")).unwrap(), 100);
        assert_eq!(ranked_limit(Some("0")).unwrap(), 50);
        assert_eq!(ranked_limit(Some("-5")).unwrap(), 10);
        assert!(ranked_limit(Some("ten")).is_err());
    }
}
