//! Catalog writes. Every show is written together with its network, genres,
//! companies and cast in one transaction, so readers never see a show with a
//! partial set of associations.
//!
//! Identity rules:
//! - genre: name, compared after [`fold_case`]
//! - actor: name
//! - network and company: (name, logo, countries), with NULL equal to NULL

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};

use super::fold_case;

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkRecord {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub countries: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub countries: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterRecord {
    pub actor: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub order_num: Option<i64>,
}

/// A show with everything attached to it, as found in a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct ShowRecord {
    pub show_id: i64,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default)]
    pub seasons: Option<i64>,
    #[serde(default)]
    pub episodes: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub tmdb_rating: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub creators: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub network_country: Option<String>,
    #[serde(default)]
    pub network: Option<NetworkRecord>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub companies: Vec<CompanyRecord>,
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
}

/// Insert or replace a show. Associations from an earlier write of the same
/// show id are dropped and rebuilt from `record`.
pub async fn upsert_show(pool: &SqlitePool, record: &ShowRecord) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let network_id = match record.network {
        Some(ref network) => Some(
            resolve_network(&mut *tx, network)
                .await
                .with_context(|| format!("Failed to resolve network '{}'", network.name))?,
        ),
        None => None,
    };

    sqlx::query(
        r#"
        INSERT INTO tv_show (
            show_id, name, original_name, first_air_date, last_air_date,
            seasons, episodes, status, overview, popularity, tmdb_rating,
            vote_count, creators, poster_url, backdrop_url, network_id, network_country,
            name_folded, original_name_folded, status_folded, creators_folded,
            network_country_folded
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(show_id) DO UPDATE SET
            name = excluded.name,
            original_name = excluded.original_name,
            first_air_date = excluded.first_air_date,
            last_air_date = excluded.last_air_date,
            seasons = excluded.seasons,
            episodes = excluded.episodes,
            status = excluded.status,
            overview = excluded.overview,
            popularity = excluded.popularity,
            tmdb_rating = excluded.tmdb_rating,
            vote_count = excluded.vote_count,
            creators = excluded.creators,
            poster_url = excluded.poster_url,
            backdrop_url = excluded.backdrop_url,
            network_id = excluded.network_id,
            network_country = excluded.network_country,
            name_folded = excluded.name_folded,
            original_name_folded = excluded.original_name_folded,
            status_folded = excluded.status_folded,
            creators_folded = excluded.creators_folded,
            network_country_folded = excluded.network_country_folded
        "#,
    )
    .bind(record.show_id)
    .bind(&record.name)
    .bind(&record.original_name)
    .bind(&record.first_air_date)
    .bind(&record.last_air_date)
    .bind(record.seasons)
    .bind(record.episodes)
    .bind(&record.status)
    .bind(&record.overview)
    .bind(record.popularity)
    .bind(record.tmdb_rating)
    .bind(record.vote_count)
    .bind(&record.creators)
    .bind(&record.poster_url)
    .bind(&record.backdrop_url)
    .bind(network_id)
    .bind(&record.network_country)
    .bind(fold_case(&record.name))
    .bind(record.original_name.as_deref().map(fold_case))
    .bind(record.status.as_deref().map(fold_case))
    .bind(record.creators.as_deref().map(fold_case))
    .bind(record.network_country.as_deref().map(fold_case))
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to write show {}", record.show_id))?;

    for table in ["show_genres", "show_companies", "characters"] {
        sqlx::query(&format!("DELETE FROM {} WHERE show_id = ?", table))
            .bind(record.show_id)
            .execute(&mut *tx)
            .await?;
    }

    for genre in record.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
        let genre_id = resolve_genre(&mut *tx, genre).await?;
        sqlx::query("INSERT OR IGNORE INTO show_genres (show_id, genre_id) VALUES (?, ?)")
            .bind(record.show_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
    }

    for company in &record.companies {
        let company_id = resolve_company(&mut *tx, company)
            .await
            .with_context(|| format!("Failed to resolve company '{}'", company.name))?;
        sqlx::query("INSERT OR IGNORE INTO show_companies (show_id, company_id) VALUES (?, ?)")
            .bind(record.show_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await?;
    }

    for character in &record.characters {
        let actor_id = resolve_actor(&mut *tx, character).await?;
        sqlx::query(
            "INSERT INTO characters (show_id, actor_id, name, order_num) VALUES (?, ?, ?, ?)",
        )
        .bind(record.show_id)
        .bind(actor_id)
        .bind(&character.character)
        .bind(character.order_num)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        "Stored show {} '{}' ({} genres, {} companies, {} characters)",
        record.show_id,
        record.name,
        record.genres.len(),
        record.companies.len(),
        record.characters.len()
    );

    Ok(record.show_id)
}

async fn resolve_network(conn: &mut SqliteConnection, network: &NetworkRecord) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT network_id FROM networks WHERE name = ? AND logo IS ? AND countries IS ?",
    )
    .bind(&network.name)
    .bind(&network.logo)
    .bind(&network.countries)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO networks (name, name_folded, logo, countries) VALUES (?, ?, ?, ?)",
    )
    .bind(&network.name)
    .bind(fold_case(&network.name))
    .bind(&network.logo)
    .bind(&network.countries)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn resolve_company(conn: &mut SqliteConnection, company: &CompanyRecord) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT company_id FROM company WHERE name = ? AND logo IS ? AND countries IS ?",
    )
    .bind(&company.name)
    .bind(&company.logo)
    .bind(&company.countries)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO company (name, name_folded, logo, countries) VALUES (?, ?, ?, ?)",
    )
    .bind(&company.name)
    .bind(fold_case(&company.name))
    .bind(&company.logo)
    .bind(&company.countries)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn resolve_genre(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    // first spelling wins: "drama" reuses the "Drama" row
    let folded = fold_case(name);
    sqlx::query(
        "INSERT INTO genres (name, name_folded) VALUES (?, ?) ON CONFLICT(name_folded) DO NOTHING",
    )
    .bind(name)
    .bind(&folded)
    .execute(&mut *conn)
    .await?;

    let id = sqlx::query_scalar("SELECT genre_id FROM genres WHERE name_folded = ?")
        .bind(&folded)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

async fn resolve_actor(conn: &mut SqliteConnection, character: &CharacterRecord) -> Result<i64> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT actor_id FROM actors WHERE name = ? ORDER BY actor_id LIMIT 1")
            .bind(&character.actor)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        if character.profile_url.is_some() {
            sqlx::query("UPDATE actors SET profile_url = ? WHERE actor_id = ?")
                .bind(&character.profile_url)
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        return Ok(id);
    }

    let result = sqlx::query("INSERT INTO actors (name, name_folded, profile_url) VALUES (?, ?, ?)")
        .bind(&character.actor)
        .bind(fold_case(&character.actor))
        .bind(&character.profile_url)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn show_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM tv_show")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
