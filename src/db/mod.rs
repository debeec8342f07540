use anyhow::Result;
use sqlx::SqlitePool;

pub mod catalog;

/// Lowercase text the way search terms are lowercased. SQLite's LOWER() and
/// NOCASE only fold ASCII, so searchable columns keep a copy folded here.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS networks (
            network_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            logo TEXT,
            countries TEXT
        );

        CREATE TABLE IF NOT EXISTS tv_show (
            show_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            original_name TEXT,
            first_air_date TEXT,
            last_air_date TEXT,
            seasons INTEGER,
            episodes INTEGER,
            status TEXT,
            overview TEXT,
            popularity REAL,
            tmdb_rating REAL,
            vote_count INTEGER,
            creators TEXT,
            poster_url TEXT,
            backdrop_url TEXT,
            network_id INTEGER REFERENCES networks(network_id) ON DELETE SET NULL,
            network_country TEXT,
            -- fold_case() copies of the searchable text columns
            name_folded TEXT NOT NULL,
            original_name_folded TEXT,
            status_folded TEXT,
            creators_folded TEXT,
            network_country_folded TEXT
        );

        CREATE TABLE IF NOT EXISTS genres (
            genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS show_genres (
            show_id INTEGER NOT NULL REFERENCES tv_show(show_id) ON DELETE CASCADE,
            genre_id INTEGER NOT NULL REFERENCES genres(genre_id) ON DELETE CASCADE,
            PRIMARY KEY (show_id, genre_id)
        );

        CREATE TABLE IF NOT EXISTS company (
            company_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            logo TEXT,
            countries TEXT
        );

        CREATE TABLE IF NOT EXISTS show_companies (
            show_id INTEGER NOT NULL REFERENCES tv_show(show_id) ON DELETE CASCADE,
            company_id INTEGER NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
            PRIMARY KEY (show_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS actors (
            actor_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            profile_url TEXT
        );

        -- One row per role an actor plays on a show
        CREATE TABLE IF NOT EXISTS characters (
            show_id INTEGER NOT NULL REFERENCES tv_show(show_id) ON DELETE CASCADE,
            actor_id INTEGER NOT NULL REFERENCES actors(actor_id) ON DELETE CASCADE,
            name TEXT,
            order_num INTEGER
        );

        CREATE TABLE IF NOT EXISTS api_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            api_key TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_used_at TEXT,
            request_count INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    Ok(())
}

/// Create all database indexes used by the search and stats queries
async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = [
        // =========================================
        // Identity
        // =========================================

        // Networks and companies are the same row when name, logo and countries agree
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_networks_identity ON networks(name, COALESCE(logo, ''), COALESCE(countries, ''))",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_company_identity ON company(name, COALESCE(logo, ''), COALESCE(countries, ''))",

        // Actors are matched by exact name
        "CREATE INDEX IF NOT EXISTS idx_actors_name ON actors(name)",

        // =========================================
        // Filter joins
        // =========================================
        "CREATE INDEX IF NOT EXISTS idx_characters_show ON characters(show_id)",
        "CREATE INDEX IF NOT EXISTS idx_characters_actor ON characters(actor_id)",
        "CREATE INDEX IF NOT EXISTS idx_show_genres_genre ON show_genres(genre_id)",
        "CREATE INDEX IF NOT EXISTS idx_show_companies_company ON show_companies(company_id)",
        "CREATE INDEX IF NOT EXISTS idx_tv_show_network ON tv_show(network_id)",

        // =========================================
        // Ranked lists
        // =========================================
        "CREATE INDEX IF NOT EXISTS idx_tv_show_rating ON tv_show(tmdb_rating)",
        "CREATE INDEX IF NOT EXISTS idx_tv_show_popularity ON tv_show(popularity)",
        "CREATE INDEX IF NOT EXISTS idx_tv_show_first_air ON tv_show(first_air_date)",

        // =========================================
        // Exact-match filters
        // =========================================
        "CREATE INDEX IF NOT EXISTS idx_tv_show_status_folded ON tv_show(status_folded)",
    ];

    for index_sql in indexes {
        if let Err(e) = sqlx::query(index_sql).execute(pool).await {
            tracing::warn!("Failed to create index: {} - {}", index_sql, e);
        }
    }

    tracing::debug!("Database indexes created/verified");

    Ok(())
}
