use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::{CastMember, Company, Genre, Show, ShowNetwork, ShowSummary, SHOW_SUMMARY_COLUMNS};
use crate::services::filter_query::{
    bind_values, predicates, FilterEcho, FilterQueryBuilder, Pagination, SearchError, ShowFilters,
};

/// Paginated search result; the listing endpoint uses the same shape
#[derive(Debug, Serialize)]
pub struct ShowSearchResponse {
    pub count: i64,
    pub page: u32,
    pub limit: u32,
    pub filters: FilterEcho,
    pub data: Vec<ShowSummary>,
}

/// Run a filtered search: total matches first, then the requested page.
pub async fn search(
    pool: &SqlitePool,
    filters: &ShowFilters,
    pagination: Pagination,
) -> Result<ShowSearchResponse, SearchError> {
    let builder = FilterQueryBuilder::from_predicates(predicates(filters)?);
    let query = builder.build(pagination);

    tracing::debug!(
        sql = %query.data_sql,
        params = query.params().len(),
        "show search"
    );

    let (count,): (i64,) = bind_values(sqlx::query_as(&query.count_sql), query.filter_params())
        .fetch_one(pool)
        .await?;

    // No point asking for a page past the end
    let data: Vec<ShowSummary> = if pagination.offset() >= count {
        Vec::new()
    } else {
        bind_values(sqlx::query_as(&query.data_sql), query.params())
            .fetch_all(pool)
            .await?
    };

    Ok(ShowSearchResponse {
        count,
        page: pagination.page,
        limit: pagination.limit,
        filters: FilterEcho::new(filters, &query.applied),
        data,
    })
}

/// Unfiltered listing
pub async fn list(pool: &SqlitePool, pagination: Pagination) -> Result<ShowSearchResponse, SearchError> {
    search(pool, &ShowFilters::default(), pagination).await
}

pub async fn random(pool: &SqlitePool, count: u32) -> Result<Vec<ShowSummary>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM tv_show s ORDER BY RANDOM() LIMIT ?",
        SHOW_SUMMARY_COLUMNS
    ))
    .bind(count as i64)
    .fetch_all(pool)
    .await
}

/// Fixed orderings for the ranked show lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowRanking {
    Popular,
    TopRated,
    LongestRunning,
}

impl ShowRanking {
    fn clause(self) -> &'static str {
        match self {
            ShowRanking::Popular => {
                "WHERE s.popularity IS NOT NULL ORDER BY s.popularity DESC, s.show_id"
            }
            ShowRanking::TopRated => {
                "WHERE s.tmdb_rating IS NOT NULL \
                 ORDER BY s.tmdb_rating DESC, COALESCE(s.vote_count, 0) DESC, s.show_id"
            }
            ShowRanking::LongestRunning => {
                "WHERE s.episodes IS NOT NULL \
                 ORDER BY s.episodes DESC, COALESCE(s.seasons, 0) DESC, s.show_id"
            }
        }
    }
}

pub async fn ranked(
    pool: &SqlitePool,
    ranking: ShowRanking,
    limit: u32,
) -> Result<Vec<ShowSummary>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM tv_show s {} LIMIT ?",
        SHOW_SUMMARY_COLUMNS,
        ranking.clause()
    ))
    .bind(limit as i64)
    .fetch_all(pool)
    .await
}

pub async fn summary(pool: &SqlitePool, show_id: i64) -> Result<Option<ShowSummary>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM tv_show s WHERE s.show_id = ?",
        SHOW_SUMMARY_COLUMNS
    ))
    .bind(show_id)
    .fetch_optional(pool)
    .await
}

/// A show with its related rows expanded
#[derive(Debug, Serialize)]
pub struct ShowDetail {
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
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub creators: Vec<String>,
    pub genres: Vec<Genre>,
    pub network: Option<ShowNetwork>,
    pub companies: Vec<Company>,
    pub actors: Vec<CastMember>,
}

pub async fn detail(pool: &SqlitePool, show_id: i64) -> Result<Option<ShowDetail>, sqlx::Error> {
    let show: Option<Show> = sqlx::query_as("SELECT * FROM tv_show WHERE show_id = ?")
        .bind(show_id)
        .fetch_optional(pool)
        .await?;

    let Some(show) = show else {
        return Ok(None);
    };

    let genres: Vec<Genre> = sqlx::query_as(
        r#"
        SELECT g.genre_id, g.name
        FROM genres g
        JOIN show_genres sg ON sg.genre_id = g.genre_id
        WHERE sg.show_id = ?
        ORDER BY g.name
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    let network: Option<ShowNetwork> = sqlx::query_as(
        r#"
        SELECT n.network_id, n.name, n.logo, s.network_country AS country
        FROM tv_show s
        JOIN networks n ON n.network_id = s.network_id
        WHERE s.show_id = ?
        "#,
    )
    .bind(show_id)
    .fetch_optional(pool)
    .await?;

    let companies: Vec<Company> = sqlx::query_as(
        r#"
        SELECT co.company_id, co.name, co.logo, co.countries
        FROM company co
        JOIN show_companies sc ON sc.company_id = co.company_id
        WHERE sc.show_id = ?
        ORDER BY co.name
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    let actors: Vec<CastMember> = sqlx::query_as(
        r#"
        SELECT a.actor_id, a.name, c.name AS character, a.profile_url, c.order_num
        FROM characters c
        JOIN actors a ON a.actor_id = c.actor_id
        WHERE c.show_id = ?
        ORDER BY c.order_num IS NULL, c.order_num, a.name
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    let creators = show.creator_list();

    Ok(Some(ShowDetail {
        show_id: show.show_id,
        name: show.name,
        original_name: show.original_name,
        first_air_date: show.first_air_date,
        last_air_date: show.last_air_date,
        seasons: show.seasons,
        episodes: show.episodes,
        status: show.status,
        overview: show.overview,
        popularity: show.popularity,
        tmdb_rating: show.tmdb_rating,
        vote_count: show.vote_count,
        poster_url: show.poster_url,
        backdrop_url: show.backdrop_url,
        creators,
        genres,
        network,
        companies,
        actors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seeded_pool, show_id};

    async fn ids(pool: &SqlitePool, names: &[&str]) -> Vec<i64> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(show_id(pool, name).await);
        }
        ids.sort();
        ids
    }

    fn result_ids(response: &ShowSearchResponse) -> Vec<i64> {
        response.data.iter().map(|s| s.show_id).collect()
    }

    fn filters() -> ShowFilters {
        ShowFilters::default()
    }

    #[tokio::test]
    async fn test_genre_rating_and_date_together() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            genres: Some("Drama".to_string()),
            min_rating: Some(7.0),
            start_date: Some("2020-01-01".to_string()),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(
            result_ids(&response),
            ids(&pool, &["In the Mud", "Butterfly", "Severance"]).await
        );
        assert_eq!(response.count, 3);
        assert_eq!(response.filters.genres.as_deref(), Some("Drama"));
        assert_eq!(response.filters.start_date.as_deref(), Some("2020-01-01"));
    }

    #[tokio::test]
    async fn test_actor_list_is_ored() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            actors: Some("Ana Garibaldi,Daniel Dae Kim".to_string()),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(
            result_ids(&response),
            ids(&pool, &["In the Mud", "Butterfly", "Lost", "Hawaii Five-0"]).await
        );
        // one row per show even though two actors match In the Mud
        assert_eq!(response.count, 4);
    }

    #[tokio::test]
    async fn test_unknown_studio_matches_nothing() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            studios: Some("NonExistentStudio".to_string()),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(response.count, 0);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_second_page() {
        let pool = seeded_pool().await;
        let response = list(&pool, Pagination::new(2, 5)).await.unwrap();

        assert_eq!(response.count, 8);
        assert_eq!(response.page, 2);
        assert_eq!(response.limit, 5);
        assert_eq!(result_ids(&response), vec![6, 7, 8]);
        assert_eq!(response.filters, FilterEcho::default());
    }

    #[tokio::test]
    async fn test_pages_partition_results() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            genres: Some("Drama".to_string()),
            ..filters()
        };

        let all = search(&pool, &f, Pagination::new(1, 100)).await.unwrap();
        let mut paged = Vec::new();
        for page in 1..=4 {
            let response = search(&pool, &f, Pagination::new(page, 2)).await.unwrap();
            assert_eq!(response.count, all.count);
            assert!(response.data.len() <= 2);
            paged.extend(result_ids(&response));
        }

        assert_eq!(paged, result_ids(&all));
        assert_eq!(all.count, 6);
    }

    #[tokio::test]
    async fn test_adding_a_filter_narrows() {
        let pool = seeded_pool().await;
        let broad = ShowFilters {
            genres: Some("Comedy,Drama".to_string()),
            ..filters()
        };
        let narrow = ShowFilters {
            status: Some("ended".to_string()),
            ..broad.clone()
        };

        let broad = search(&pool, &broad, Pagination::default()).await.unwrap();
        let narrow = search(&pool, &narrow, Pagination::default()).await.unwrap();

        assert_eq!(broad.count, 7);
        assert_eq!(
            result_ids(&narrow),
            ids(&pool, &["The Office", "Lost", "Hawaii Five-0", "Dark"]).await
        );
        assert!(result_ids(&narrow)
            .iter()
            .all(|id| result_ids(&broad).contains(id)));
    }

    #[tokio::test]
    async fn test_equal_rating_bounds() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            min_rating: Some(7.0),
            max_rating: Some(7.0),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["Hawaii Five-0"]).await);
    }

    #[tokio::test]
    async fn test_page_past_the_end() {
        let pool = seeded_pool().await;
        let response = list(&pool, Pagination::new(10, 5)).await.unwrap();

        assert_eq!(response.count, 8);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_case_insensitive_text_filters() {
        let pool = seeded_pool().await;

        let netflix = ShowFilters {
            network: Some("netflix".to_string()),
            ..filters()
        };
        let response = search(&pool, &netflix, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["In the Mud", "Dark"]).await);

        let us = ShowFilters {
            country: Some("us".to_string()),
            ..filters()
        };
        let response = search(&pool, &us, Pagination::default()).await.unwrap();
        assert_eq!(
            result_ids(&response),
            ids(&pool, &["Butterfly", "The Office", "Lost", "Hawaii Five-0", "Severance"]).await
        );
    }

    #[tokio::test]
    async fn test_creators_and_name() {
        let pool = seeded_pool().await;

        let creators = ShowFilters {
            creators: Some("Lindelof, Dan Erickson".to_string()),
            ..filters()
        };
        let response = search(&pool, &creators, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["Lost", "Severance"]).await);

        // name also matches original_name
        let name = ShowFilters {
            name: Some("BARRO".to_string()),
            ..filters()
        };
        let response = search(&pool, &name, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["In the Mud"]).await);

        let wildcard = ShowFilters {
            name: Some("%".to_string()),
            ..filters()
        };
        let response = search(&pool, &wildcard, Pagination::default()).await.unwrap();
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_accented_text_matches_any_case() {
        let pool = seeded_pool().await;
        let in_the_mud = ids(&pool, &["In the Mud"]).await;

        for needle in ["sebastián", "SEBASTIÁN", "Sebastián Ortega"] {
            let f = ShowFilters {
                creators: Some(needle.to_string()),
                ..filters()
            };
            let response = search(&pool, &f, Pagination::default()).await.unwrap();
            assert_eq!(result_ids(&response), in_the_mud, "creators={}", needle);
        }

        let mut record = crate::db::test_support::fixture_shows().remove(7);
        record.show_id = 50;
        record.name = "Él Camino".to_string();
        record.status = Some("Emisión".to_string());
        record.genres = vec!["Ciencia Ficción".to_string()];
        record.network = Some(crate::db::catalog::NetworkRecord {
            name: "Señal Ñ".to_string(),
            logo: None,
            countries: Some("ES".to_string()),
        });
        crate::db::catalog::upsert_show(&pool, &record).await.unwrap();

        let upper = ShowFilters {
            name: Some("ÉL CAMINO".to_string()),
            genres: Some("CIENCIA FICCIÓN".to_string()),
            network: Some("SEÑAL".to_string()),
            status: Some("EMISIÓN".to_string()),
            ..filters()
        };
        let response = search(&pool, &upper, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), vec![50]);
        // stored text keeps its original case
        assert_eq!(response.data[0].name, "Él Camino");
    }

    #[tokio::test]
    async fn test_actor_and_studio_share_no_joins() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            actors: Some("Daniel".to_string()),
            studios: Some("cbs".to_string()),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["Hawaii Five-0"]).await);
    }

    #[tokio::test]
    async fn test_end_date_bound() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            end_date: Some("2013-12-31".to_string()),
            ..filters()
        };

        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["The Office", "Lost"]).await);
    }

    #[tokio::test]
    async fn test_quoted_values_are_plain_data() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            actors: Some("Alex O'Loughlin".to_string()),
            ..filters()
        };
        let response = search(&pool, &f, Pagination::default()).await.unwrap();
        assert_eq!(result_ids(&response), ids(&pool, &["Hawaii Five-0"]).await);

        let hostile = ShowFilters {
            name: Some("'; DROP TABLE tv_show; --".to_string()),
            ..filters()
        };
        let response = search(&pool, &hostile, Pagination::default()).await.unwrap();
        assert_eq!(response.count, 0);
        assert_eq!(list(&pool, Pagination::default()).await.unwrap().count, 8);
    }

    #[tokio::test]
    async fn test_search_is_repeatable() {
        let pool = seeded_pool().await;
        let f = ShowFilters {
            genres: Some("Mystery, Drama".to_string()),
            min_rating: Some(8.0),
            ..filters()
        };

        let first = search(&pool, &f, Pagination::new(1, 3)).await.unwrap();
        let second = search(&pool, &f, Pagination::new(1, 3)).await.unwrap();
        assert_eq!(result_ids(&first), result_ids(&second));
        assert_eq!(first.count, second.count);
    }

    #[tokio::test]
    async fn test_ranked_lists() {
        let pool = seeded_pool().await;

        let popular = ranked(&pool, ShowRanking::Popular, 2).await.unwrap();
        let popular: Vec<i64> = popular.iter().map(|s| s.show_id).collect();
        assert_eq!(popular, vec![1, 7]);

        let top: Vec<i64> = ranked(&pool, ShowRanking::TopRated, 3)
            .await
            .unwrap()
            .iter()
            .map(|s| s.show_id)
            .collect();
        assert_eq!(top, vec![3, 6, 7]);

        let longest: Vec<i64> = ranked(&pool, ShowRanking::LongestRunning, 3)
            .await
            .unwrap()
            .iter()
            .map(|s| s.show_id)
            .collect();
        assert_eq!(longest, vec![5, 3, 4]);

        // the unrated pilot never shows up in rating order
        let all_rated = ranked(&pool, ShowRanking::TopRated, 100).await.unwrap();
        assert_eq!(all_rated.len(), 7);
    }

    #[tokio::test]
    async fn test_random_sample() {
        let pool = seeded_pool().await;
        let sample = random(&pool, 3).await.unwrap();
        assert_eq!(sample.len(), 3);

        let all = random(&pool, 50).await.unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_detail_expands_relations() {
        let pool = seeded_pool().await;
        let id = show_id(&pool, "In the Mud").await;

        let detail = detail(&pool, id).await.unwrap().unwrap();
        assert_eq!(detail.creators, vec!["Sebastián Ortega".to_string()]);
        let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["Crime", "Drama"]);

        let network = detail.network.unwrap();
        assert_eq!(network.name, "Netflix");
        assert_eq!(network.country.as_deref(), Some("AR"));

        assert_eq!(detail.companies.len(), 2);
        let cast: Vec<&str> = detail.actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(cast, vec!["Ana Garibaldi", "Valentina Zenere", "Daniel Dae Kim"]);
        assert_eq!(detail.actors[0].character.as_deref(), Some("Gladys Guerra"));
    }

    #[tokio::test]
    async fn test_detail_and_summary_of_missing_show() {
        let pool = seeded_pool().await;
        assert!(detail(&pool, 12345).await.unwrap().is_none());
        assert!(summary(&pool, 12345).await.unwrap().is_none());

        let office = summary(&pool, 3).await.unwrap().unwrap();
        assert_eq!(office.name, "The Office");
        assert_eq!(office.episodes, Some(201));
    }
}
