use axum::{middleware, Router};
use std::sync::Arc;

use crate::error::AppError;
use crate::services::filter_query::{parse_integer, Pagination, SearchError};
use crate::AppState;

mod actors;
mod api_keys;
pub mod auth;
mod genres;
mod shows;
mod stats;
pub mod system;

/// All data routes. Everything except key issuance sits behind the API key check.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .nest("/shows", shows::routes())
        .nest("/actors", actors::routes())
        .nest("/genres", genres::routes())
        .nest("/stats", stats::routes())
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_key));

    Router::new()
        .nest("/api-key", api_keys::routes())
        .merge(protected)
}

/// Page/limit from raw query text. Blank values count as absent, limits
/// above the configured maximum are clamped.
pub(crate) fn pagination(
    state: &AppState,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<Pagination, SearchError> {
    let page = match present(page) {
        Some(raw) => parse_integer("page", raw)?,
        None => 1,
    };
    let limit = match present(limit) {
        Some(raw) => parse_integer("limit", raw)?,
        None => state.config.api.default_page_size as i64,
    };

    Ok(Pagination::new(
        page,
        limit.min(state.config.api.max_page_size as i64),
    ))
}

pub(crate) fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} ID must be a number", what)))
}
