//! Dynamic filter query builder for the show search endpoint.
//!
//! Search filters become an ordered list of [`Predicate`] descriptors. The
//! descriptors are folded into a [`FilterQueryBuilder`], which is then forked
//! into a data query and a count query sharing one FROM/WHERE body and one
//! positional parameter list. Only the fixed column and join text defined in
//! this module ever reaches the SQL string; every user value is bound.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Sqlite};

use crate::db::fold_case;
use crate::models::SHOW_SUMMARY_COLUMNS;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

const MIN_RATING: f64 = 0.0;
const MAX_RATING: f64 = 10.0;

const JOIN_CHARACTERS: &str = "JOIN characters c ON c.show_id = s.show_id";
const JOIN_ACTORS: &str = "JOIN actors a ON a.actor_id = c.actor_id";
const JOIN_SHOW_GENRES: &str = "JOIN show_genres sg ON sg.show_id = s.show_id";
const JOIN_GENRES: &str = "JOIN genres g ON g.genre_id = sg.genre_id";
const JOIN_NETWORKS: &str = "JOIN networks n ON n.network_id = s.network_id";
const JOIN_SHOW_COMPANIES: &str = "JOIN show_companies sc ON sc.show_id = s.show_id";
const JOIN_COMPANIES: &str = "JOIN company co ON co.company_id = sc.company_id";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidFilterInput { field: &'static str, reason: String },

    #[error("query execution failed: {0}")]
    QueryExecutionFailed(#[from] sqlx::Error),
}

impl SearchError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SearchError::InvalidFilterInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Typed search filters. `None` and blank strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowFilters {
    pub actors: Option<String>,
    pub genres: Option<String>,
    pub network: Option<String>,
    pub studios: Option<String>,
    pub status: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub country: Option<String>,
    pub creators: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Clamp `page` to at least 1 and `limit` into `1..=MAX_PAGE_SIZE`
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            limit: limit.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Real(f64),
    Integer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Actors,
    Genres,
    Network,
    Studios,
    Status,
    MinRating,
    MaxRating,
    StartDate,
    EndDate,
    Country,
    Creators,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    /// Substring of a folded column
    Contains,
    /// Equality with a folded column
    Equals,
    AtLeast,
    AtMost,
}

/// Text terms always name a `*_folded` column and bind a folded value
#[derive(Debug, Clone, PartialEq)]
struct Term {
    column: &'static str,
    comparison: Comparison,
    value: FilterValue,
}

impl Term {
    fn contains(column: &'static str, needle: &str) -> Self {
        Self {
            column,
            comparison: Comparison::Contains,
            value: FilterValue::Text(format!("%{}%", escape_like(&fold_case(needle)))),
        }
    }

    fn equals(column: &'static str, value: &str) -> Self {
        Self {
            column,
            comparison: Comparison::Equals,
            value: FilterValue::Text(fold_case(value)),
        }
    }

    fn bound(column: &'static str, comparison: Comparison, value: FilterValue) -> Self {
        Self {
            column,
            comparison,
            value,
        }
    }

    fn render(&self, position: usize) -> String {
        match self.comparison {
            Comparison::Contains => format!("{} LIKE ${} ESCAPE '\\'", self.column, position),
            Comparison::Equals => format!("{} = ${}", self.column, position),
            Comparison::AtLeast => format!("{} >= ${}", self.column, position),
            Comparison::AtMost => format!("{} <= ${}", self.column, position),
        }
    }
}

/// One filter dimension: the joins it needs and its OR-ed terms
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: FilterField,
    joins: &'static [&'static str],
    terms: Vec<Term>,
}

impl Predicate {
    fn new(field: FilterField, joins: &'static [&'static str], terms: Vec<Term>) -> Option<Self> {
        if terms.is_empty() {
            None
        } else {
            Some(Self {
                field,
                joins,
                terms,
            })
        }
    }

    fn list(
        field: FilterField,
        joins: &'static [&'static str],
        raw: Option<&str>,
        term: impl Fn(&str) -> Term,
    ) -> Option<Self> {
        let terms = raw.map(split_list).unwrap_or_default();
        Self::new(field, joins, terms.iter().map(|item| term(item)).collect())
    }

    fn scalar(
        field: FilterField,
        joins: &'static [&'static str],
        raw: Option<&str>,
        terms: impl Fn(&str) -> Vec<Term>,
    ) -> Option<Self> {
        let value = normalize(raw)?;
        Self::new(field, joins, terms(value))
    }
}

/// Turn filters into the ordered predicate list, skipping absent ones.
pub fn predicates(filters: &ShowFilters) -> Result<Vec<Predicate>, SearchError> {
    let min_rating = filters
        .min_rating
        .map(|r| check_rating("minRating", r))
        .transpose()?;
    let max_rating = filters
        .max_rating
        .map(|r| check_rating("maxRating", r))
        .transpose()?;
    let start_date = normalize(filters.start_date.as_deref())
        .map(|d| parse_date("startDate", d))
        .transpose()?;
    let end_date = normalize(filters.end_date.as_deref())
        .map(|d| parse_date("endDate", d))
        .transpose()?;

    let candidates = [
        Predicate::list(
            FilterField::Actors,
            &[JOIN_CHARACTERS, JOIN_ACTORS],
            filters.actors.as_deref(),
            |actor| Term::contains("a.name_folded", actor),
        ),
        Predicate::list(
            FilterField::Genres,
            &[JOIN_SHOW_GENRES, JOIN_GENRES],
            filters.genres.as_deref(),
            |genre| Term::equals("g.name_folded", genre),
        ),
        Predicate::scalar(
            FilterField::Network,
            &[JOIN_NETWORKS],
            filters.network.as_deref(),
            |network| vec![Term::contains("n.name_folded", network)],
        ),
        Predicate::scalar(
            FilterField::Studios,
            &[JOIN_SHOW_COMPANIES, JOIN_COMPANIES],
            filters.studios.as_deref(),
            |studio| vec![Term::contains("co.name_folded", studio)],
        ),
        Predicate::scalar(
            FilterField::Status,
            &[],
            filters.status.as_deref(),
            |status| vec![Term::equals("s.status_folded", status)],
        ),
        min_rating.and_then(|r| {
            Predicate::new(
                FilterField::MinRating,
                &[],
                vec![Term::bound("s.tmdb_rating", Comparison::AtLeast, FilterValue::Real(r))],
            )
        }),
        max_rating.and_then(|r| {
            Predicate::new(
                FilterField::MaxRating,
                &[],
                vec![Term::bound("s.tmdb_rating", Comparison::AtMost, FilterValue::Real(r))],
            )
        }),
        start_date.and_then(|d| {
            Predicate::new(
                FilterField::StartDate,
                &[],
                vec![Term::bound("s.first_air_date", Comparison::AtLeast, FilterValue::Text(d))],
            )
        }),
        end_date.and_then(|d| {
            Predicate::new(
                FilterField::EndDate,
                &[],
                vec![Term::bound("s.last_air_date", Comparison::AtMost, FilterValue::Text(d))],
            )
        }),
        Predicate::scalar(
            FilterField::Country,
            &[],
            filters.country.as_deref(),
            |country| vec![Term::contains("s.network_country_folded", country)],
        ),
        Predicate::list(
            FilterField::Creators,
            &[],
            filters.creators.as_deref(),
            |creator| Term::contains("s.creators_folded", creator),
        ),
        Predicate::scalar(FilterField::Name, &[], filters.name.as_deref(), |name| {
            vec![
                Term::contains("s.name_folded", name),
                Term::contains("s.original_name_folded", name),
            ]
        }),
    ];

    Ok(candidates.into_iter().flatten().collect())
}

/// Accumulated joins, conditions and parameters for one search
#[derive(Debug, Clone, Default)]
pub struct FilterQueryBuilder {
    joins: Vec<&'static str>,
    conditions: Vec<String>,
    params: Vec<FilterValue>,
    applied: Vec<FilterField>,
}

impl FilterQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_predicates(predicates: Vec<Predicate>) -> Self {
        predicates.into_iter().fold(Self::new(), Self::with)
    }

    /// Append one predicate. Its joins are registered once, its terms get the
    /// next placeholder positions and are OR-ed together.
    pub fn with(mut self, predicate: Predicate) -> Self {
        for join in predicate.joins {
            if !self.joins.contains(join) {
                self.joins.push(join);
            }
        }

        let mut alternatives = Vec::with_capacity(predicate.terms.len());
        for term in predicate.terms {
            let rendered = term.render(self.params.len() + 1);
            self.params.push(term.value);
            alternatives.push(rendered);
        }

        let condition = if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            format!("({})", alternatives.join(" OR "))
        };

        self.conditions.push(condition);
        self.applied.push(predicate.field);
        self
    }

    fn body(&self) -> String {
        let mut body = String::from("FROM tv_show s");
        for join in &self.joins {
            body.push(' ');
            body.push_str(join);
        }
        if !self.conditions.is_empty() {
            body.push_str(" WHERE ");
            body.push_str(&self.conditions.join(" AND "));
        }
        body
    }

    /// Fork the accumulated state into the data and count statements
    pub fn build(self, pagination: Pagination) -> ShowQuery {
        let body = self.body();
        let filter_param_count = self.params.len();

        let count_sql = format!("SELECT COUNT(DISTINCT s.show_id) {}", body);
        let data_sql = format!(
            "SELECT DISTINCT {} {} ORDER BY s.show_id ASC LIMIT ${} OFFSET ${}",
            SHOW_SUMMARY_COLUMNS,
            body,
            filter_param_count + 1,
            filter_param_count + 2
        );

        debug_assert!(count_sql.ends_with(&body) && data_sql.contains(&body));

        let mut params = self.params;
        params.push(FilterValue::Integer(pagination.limit as i64));
        params.push(FilterValue::Integer(pagination.offset()));

        ShowQuery {
            data_sql,
            count_sql,
            params,
            filter_param_count,
            applied: self.applied,
        }
    }
}

/// The finished pair of statements and their shared parameters
#[derive(Debug, Clone)]
pub struct ShowQuery {
    pub data_sql: String,
    pub count_sql: String,
    params: Vec<FilterValue>,
    filter_param_count: usize,
    pub applied: Vec<FilterField>,
}

impl ShowQuery {
    /// All parameters, pagination last
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }

    /// Parameters for the count statement (no LIMIT/OFFSET)
    pub fn filter_params(&self) -> &[FilterValue] {
        &self.params[..self.filter_param_count]
    }
}

/// Bind values in order onto a `query_as` statement
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [FilterValue],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>>
where
    O: for<'r> FromRow<'r, SqliteRow>,
{
    for value in values {
        query = match value {
            FilterValue::Text(text) => query.bind(text.as_str()),
            FilterValue::Real(real) => query.bind(*real),
            FilterValue::Integer(int) => query.bind(*int),
        };
    }
    query
}

/// Filter values as they were applied, for echoing back to the client
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEcho {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studios: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FilterEcho {
    pub fn new(filters: &ShowFilters, applied: &[FilterField]) -> Self {
        let mut echo = Self::default();
        let list = |raw: &Option<String>| raw.as_deref().map(|r| split_list(r).join(","));
        let text = |raw: &Option<String>| normalize(raw.as_deref()).map(str::to_string);

        for field in applied {
            match field {
                FilterField::Actors => echo.actors = list(&filters.actors),
                FilterField::Genres => echo.genres = list(&filters.genres),
                FilterField::Network => echo.network = text(&filters.network),
                FilterField::Studios => echo.studios = text(&filters.studios),
                FilterField::Status => echo.status = text(&filters.status),
                FilterField::MinRating => echo.min_rating = filters.min_rating,
                FilterField::MaxRating => echo.max_rating = filters.max_rating,
                FilterField::StartDate => echo.start_date = text(&filters.start_date),
                FilterField::EndDate => echo.end_date = text(&filters.end_date),
                FilterField::Country => echo.country = text(&filters.country),
                FilterField::Creators => echo.creators = list(&filters.creators),
                FilterField::Name => echo.name = text(&filters.name),
            }
        }
        echo
    }
}

// =============================================================================
// Input parsing
// =============================================================================

/// Parse a rating given as text
pub fn parse_rating(field: &'static str, raw: &str) -> Result<f64, SearchError> {
    let rating: f64 = raw
        .trim()
        .parse()
        .map_err(|_| SearchError::invalid(field, "must be a number"))?;
    check_rating(field, rating)
}

fn check_rating(field: &'static str, rating: f64) -> Result<f64, SearchError> {
    if !rating.is_finite() {
        return Err(SearchError::invalid(field, "must be a finite number"));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(SearchError::invalid(
            field,
            format!("must be between {} and {}", MIN_RATING, MAX_RATING),
        ));
    }
    Ok(rating)
}

/// Dates must be `YYYY-MM-DD` so they compare correctly as text
pub fn parse_date(field: &'static str, raw: &str) -> Result<String, SearchError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| SearchError::invalid(field, "must be an ISO date (YYYY-MM-DD)"))
}

/// Parse a page or limit value given as text
pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, SearchError> {
    raw.trim()
        .parse()
        .map_err(|_| SearchError::invalid(field, "must be an integer"))
}

fn normalize(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Escape LIKE wildcards so user text only ever matches literally
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(filters: &ShowFilters, pagination: Pagination) -> ShowQuery {
        FilterQueryBuilder::from_predicates(predicates(filters).unwrap()).build(pagination)
    }

    #[test]
    fn test_no_filters_is_plain_listing() {
        let query = build(&ShowFilters::default(), Pagination::new(2, 5));

        assert!(!query.data_sql.contains("WHERE"));
        assert!(!query.data_sql.contains("JOIN"));
        assert_eq!(
            query.count_sql,
            "SELECT COUNT(DISTINCT s.show_id) FROM tv_show s"
        );
        assert!(query
            .data_sql
            .ends_with("ORDER BY s.show_id ASC LIMIT $1 OFFSET $2"));
        assert_eq!(
            query.params(),
            &[FilterValue::Integer(5), FilterValue::Integer(5)]
        );
        assert!(query.filter_params().is_empty());
        assert!(query.applied.is_empty());
    }

    #[test]
    fn test_list_items_are_ored_and_filters_anded() {
        let filters = ShowFilters {
            genres: Some("Comedy, Drama".to_string()),
            status: Some("Ended".to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());

        assert!(query
            .count_sql
            .contains("(g.name_folded = $1 OR g.name_folded = $2) AND s.status_folded = $3"));
        assert_eq!(
            query.filter_params(),
            &[
                FilterValue::Text("comedy".to_string()),
                FilterValue::Text("drama".to_string()),
                FilterValue::Text("ended".to_string()),
            ]
        );
        assert!(query.data_sql.contains("LIMIT $4 OFFSET $5"));
    }

    #[test]
    fn test_pagination_params_follow_filter_params() {
        let filters = ShowFilters {
            name: Some("office".to_string()),
            min_rating: Some(7.0),
            ..Default::default()
        };
        let query = build(&filters, Pagination::new(3, 10));

        // name binds twice (name and original_name), rating once
        assert_eq!(query.filter_params().len(), 3);
        assert_eq!(query.params().len(), 5);
        assert_eq!(query.params()[3], FilterValue::Integer(10));
        assert_eq!(query.params()[4], FilterValue::Integer(20));
        assert!(query.data_sql.contains("LIMIT $4 OFFSET $5"));
        assert!(!query.count_sql.contains("$4"));
    }

    #[test]
    fn test_count_and_data_share_body() {
        let filters = ShowFilters {
            actors: Some("Ana Garibaldi,Daniel Dae Kim".to_string()),
            studios: Some("Studios".to_string()),
            country: Some("US".to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());

        let body = query
            .count_sql
            .strip_prefix("SELECT COUNT(DISTINCT s.show_id) ")
            .unwrap();
        assert!(query.data_sql.contains(body));
        assert!(query.data_sql.starts_with("SELECT DISTINCT s.show_id"));
    }

    #[test]
    fn test_joins_are_deduplicated() {
        let actors = Predicate::list(
            FilterField::Actors,
            &[JOIN_CHARACTERS, JOIN_ACTORS],
            Some("Steve Carell"),
            |actor| Term::contains("a.name_folded", actor),
        )
        .unwrap();

        let builder = FilterQueryBuilder::new()
            .with(actors.clone())
            .with(actors);
        let query = builder.build(Pagination::default());

        assert_eq!(query.count_sql.matches(JOIN_CHARACTERS).count(), 1);
        assert_eq!(query.count_sql.matches(JOIN_ACTORS).count(), 1);
    }

    #[test]
    fn test_user_text_never_reaches_sql() {
        let hostile = "x'); DROP TABLE tv_show; --";
        let filters = ShowFilters {
            actors: Some(format!("Alex O'Loughlin,{}", hostile)),
            network: Some(hostile.to_string()),
            status: Some(hostile.to_string()),
            country: Some("O'Brien".to_string()),
            creators: Some("Robert 'Bob' Smith".to_string()),
            name: Some(hostile.to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());

        for sql in [&query.data_sql, &query.count_sql] {
            assert!(!sql.contains("O'Loughlin"));
            assert!(!sql.contains("DROP TABLE"));
            assert!(!sql.contains("O'Brien"));
            assert!(!sql.contains("'Bob'"));
        }
        assert!(query
            .params()
            .contains(&FilterValue::Text("%alex o'loughlin%".to_string())));
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let filters = ShowFilters {
            actors: Some(" , ,".to_string()),
            genres: Some(String::new()),
            network: Some("   ".to_string()),
            start_date: Some(" ".to_string()),
            name: Some("\t".to_string()),
            ..Default::default()
        };

        assert!(predicates(&filters).unwrap().is_empty());
    }

    #[test]
    fn test_date_and_rating_bounds() {
        let filters = ShowFilters {
            min_rating: Some(7.0),
            max_rating: Some(7.0),
            start_date: Some("2020-01-01".to_string()),
            end_date: Some("2024-12-31".to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());

        assert!(query.count_sql.contains("s.tmdb_rating >= $1"));
        assert!(query.count_sql.contains("s.tmdb_rating <= $2"));
        assert!(query.count_sql.contains("s.first_air_date >= $3"));
        assert!(query.count_sql.contains("s.last_air_date <= $4"));
        assert_eq!(query.filter_params()[2], FilterValue::Text("2020-01-01".to_string()));
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let bad_date = ShowFilters {
            start_date: Some("2020-13-45".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            predicates(&bad_date),
            Err(SearchError::InvalidFilterInput { field: "startDate", .. })
        ));

        let bad_rating = ShowFilters {
            max_rating: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            predicates(&bad_rating),
            Err(SearchError::InvalidFilterInput { field: "maxRating", .. })
        ));

        assert!(parse_rating("minRating", "seven").is_err());
        assert!(parse_rating("minRating", "11").is_err());
        assert_eq!(parse_rating("minRating", " 7.5 ").unwrap(), 7.5);
        assert!(parse_integer("page", "2a").is_err());
        assert_eq!(parse_integer("limit", "25").unwrap(), 25);
        assert!(parse_date("endDate", "yesterday").is_err());
    }

    #[test]
    fn test_pagination_clamping() {
        assert_eq!(Pagination::new(0, 0), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::new(-4, 500), Pagination { page: 1, limit: 100 });
        assert_eq!(Pagination::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_text_values_are_folded() {
        let filters = ShowFilters {
            creators: Some("SEBASTIÁN".to_string()),
            genres: Some("ÉPICO".to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());

        assert!(query.count_sql.contains("g.name_folded = $1"));
        assert!(query.count_sql.contains("s.creators_folded LIKE $2 ESCAPE '\\'"));
        assert!(!query.count_sql.contains("LOWER("));
        assert_eq!(
            query.filter_params(),
            &[
                FilterValue::Text("épico".to_string()),
                FilterValue::Text("%sebastián%".to_string()),
            ]
        );
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_sure\\"), "100\\%\\_sure\\\\");

        let filters = ShowFilters {
            name: Some("50%".to_string()),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());
        assert_eq!(
            query.filter_params()[0],
            FilterValue::Text("%50\\%%".to_string())
        );
    }

    #[test]
    fn test_echo_lists_only_applied_filters() {
        let filters = ShowFilters {
            genres: Some(" Drama ,, Comedy".to_string()),
            network: Some("  ".to_string()),
            min_rating: Some(7.0),
            ..Default::default()
        };
        let query = build(&filters, Pagination::default());
        assert_eq!(query.applied, vec![FilterField::Genres, FilterField::MinRating]);
        let echo = FilterEcho::new(&filters, &query.applied);

        assert_eq!(echo.genres.as_deref(), Some("Drama,Comedy"));
        assert_eq!(echo.min_rating, Some(7.0));
        assert!(echo.network.is_none());

        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["minRating"], 7.0);
        assert!(json.get("network").is_none());
    }
}
