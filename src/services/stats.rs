use serde::Serialize;
use sqlx::SqlitePool;
use std::str::FromStr;

/// Grouping key for rating aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsDimension {
    Genres,
    Networks,
    Actors,
    Years,
    Countries,
    Status,
    Companies,
}

impl FromStr for StatsDimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genres" => Ok(StatsDimension::Genres),
            "networks" => Ok(StatsDimension::Networks),
            "actors" => Ok(StatsDimension::Actors),
            "years" => Ok(StatsDimension::Years),
            "countries" => Ok(StatsDimension::Countries),
            "status" => Ok(StatsDimension::Status),
            "companies" => Ok(StatsDimension::Companies),
            _ => Err(()),
        }
    }
}

impl StatsDimension {
    /// Each statement yields `id`, `label` and the four aggregate columns.
    /// Only shows with a rating are counted.
    fn sql(self) -> &'static str {
        match self {
            StatsDimension::Genres => {
                r#"
                SELECT g.genre_id AS id, g.name AS label,
                    COUNT(DISTINCT s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM genres g
                JOIN show_genres sg ON sg.genre_id = g.genre_id
                JOIN tv_show s ON s.show_id = sg.show_id
                WHERE s.tmdb_rating IS NOT NULL
                GROUP BY g.genre_id, g.name
                ORDER BY show_count DESC, label
                "#
            }
            // Several network rows can share a name (one per country), so group by name
            StatsDimension::Networks => {
                r#"
                SELECT NULL AS id, n.name AS label,
                    COUNT(DISTINCT s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM networks n
                JOIN tv_show s ON s.network_id = n.network_id
                WHERE s.tmdb_rating IS NOT NULL
                GROUP BY n.name
                ORDER BY show_count DESC, label
                "#
            }
            StatsDimension::Actors => {
                r#"
                SELECT a.actor_id AS id, a.name AS label,
                    COUNT(DISTINCT s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM actors a
                JOIN characters c ON c.actor_id = a.actor_id
                JOIN tv_show s ON s.show_id = c.show_id
                WHERE s.tmdb_rating IS NOT NULL
                GROUP BY a.actor_id, a.name
                ORDER BY show_count DESC, label
                LIMIT 100
                "#
            }
            StatsDimension::Years => {
                r#"
                SELECT CAST(substr(s.first_air_date, 1, 4) AS INTEGER) AS id, NULL AS label,
                    COUNT(s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM tv_show s
                WHERE s.first_air_date IS NOT NULL AND s.tmdb_rating IS NOT NULL
                GROUP BY id
                ORDER BY show_count DESC, id DESC
                "#
            }
            StatsDimension::Countries => {
                r#"
                SELECT NULL AS id, s.network_country AS label,
                    COUNT(s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM tv_show s
                WHERE s.network_country IS NOT NULL AND s.tmdb_rating IS NOT NULL
                GROUP BY s.network_country
                ORDER BY show_count DESC, label
                "#
            }
            StatsDimension::Status => {
                r#"
                SELECT NULL AS id, s.status AS label,
                    COUNT(s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM tv_show s
                WHERE s.status IS NOT NULL AND s.tmdb_rating IS NOT NULL
                GROUP BY s.status
                ORDER BY show_count DESC, label
                "#
            }
            StatsDimension::Companies => {
                r#"
                SELECT NULL AS id, co.name AS label,
                    COUNT(DISTINCT s.show_id) AS show_count,
                    AVG(s.tmdb_rating) AS avg_rating,
                    MIN(s.tmdb_rating) AS min_rating,
                    MAX(s.tmdb_rating) AS max_rating
                FROM company co
                JOIN show_companies sc ON sc.company_id = co.company_id
                JOIN tv_show s ON s.show_id = sc.show_id
                WHERE s.tmdb_rating IS NOT NULL
                GROUP BY co.name
                ORDER BY show_count DESC, label
                "#
            }
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    id: Option<i64>,
    label: Option<String>,
    show_count: i64,
    avg_rating: f64,
    min_rating: f64,
    max_rating: f64,
}

/// One aggregate line. Which key fields are present depends on the dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub show_count: i64,
    pub avg_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
}

impl StatsEntry {
    fn from_row(dimension: StatsDimension, row: AggregateRow) -> Self {
        let mut entry = StatsEntry {
            id: None,
            name: None,
            year: None,
            country: None,
            status: None,
            show_count: row.show_count,
            avg_rating: (row.avg_rating * 100.0).round() / 100.0,
            min_rating: row.min_rating,
            max_rating: row.max_rating,
        };

        match dimension {
            StatsDimension::Genres | StatsDimension::Actors => {
                entry.id = row.id;
                entry.name = row.label;
            }
            StatsDimension::Networks | StatsDimension::Companies => entry.name = row.label,
            StatsDimension::Years => entry.year = row.id,
            StatsDimension::Countries => entry.country = row.label,
            StatsDimension::Status => entry.status = row.label,
        }
        entry
    }
}

pub async fn aggregate(
    pool: &SqlitePool,
    dimension: StatsDimension,
) -> Result<Vec<StatsEntry>, sqlx::Error> {
    let rows: Vec<AggregateRow> = sqlx::query_as(dimension.sql()).fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|row| StatsEntry::from_row(dimension, row))
        .collect())
}
