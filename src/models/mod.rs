use serde::{Deserialize, Serialize};

/// Full `tv_show` row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Show {
    pub show_id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub seasons: Option<i64>,
    pub episodes: Option<i64>,
    pub status: Option<String>,
    pub overview: Option<String>,
    pub popularity: Option<f64>,
    pub tmdb_rating: Option<f64>,
    pub vote_count: Option<i64>,
    pub creators: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub network_id: Option<i64>,
    pub network_country: Option<String>,
}

impl Show {
    /// Creators are stored as one `;`-delimited text field
    pub fn creator_list(&self) -> Vec<String> {
        self.creators
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Columns selected for [`ShowSummary`], prefixed with the `s` alias used by
/// every show query.
pub const SHOW_SUMMARY_COLUMNS: &str = "s.show_id, s.name, s.original_name, s.first_air_date, \
     s.status, s.seasons, s.episodes, s.tmdb_rating, s.popularity, s.poster_url, s.overview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShowSummary {
    pub show_id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub first_air_date: Option<String>,
    pub status: Option<String>,
    pub seasons: Option<i64>,
    pub episodes: Option<i64>,
    pub tmdb_rating: Option<f64>,
    pub popularity: Option<f64>,
    pub poster_url: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
}

/// A network as attached to a show; `country` comes from the show row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShowNetwork {
    pub network_id: i64,
    pub name: String,
    pub logo: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub company_id: i64,
    pub name: String,
    pub logo: Option<String>,
    pub countries: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub actor_id: i64,
    pub name: String,
    pub profile_url: Option<String>,
}

/// An actor credited on a show, with the role they play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CastMember {
    pub actor_id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
    pub order_num: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,
    pub api_key: String,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub last_used_at: Option<String>,
    pub request_count: i64,
}
