use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct GenreCount {
    pub genre_id: i64,
    pub name: String,
    pub show_count: i64,
}

/// All genres, including ones no show uses yet
pub async fn list(pool: &SqlitePool) -> Result<Vec<GenreCount>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT g.genre_id, g.name, COUNT(sg.show_id) AS show_count
        FROM genres g
        LEFT JOIN show_genres sg ON sg.genre_id = g.genre_id
        GROUP BY g.genre_id, g.name
        ORDER BY g.genre_id
        "#,
    )
    .fetch_all(pool)
    .await
}
