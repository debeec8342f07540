use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::db::catalog::{self, ShowRecord};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub shows_imported: usize,
    pub shows_failed: usize,
}

pub fn parse_seed(contents: &str) -> Result<Vec<ShowRecord>> {
    serde_json::from_str(contents).context("Seed file is not a JSON array of show records")
}

/// Write every record; a bad record is logged and skipped
pub async fn import_records(pool: &SqlitePool, records: &[ShowRecord]) -> ImportResult {
    let mut result = ImportResult::default();

    for record in records {
        match catalog::upsert_show(pool, record).await {
            Ok(_) => result.shows_imported += 1,
            Err(e) => {
                tracing::warn!("Skipping show {} '{}': {:#}", record.show_id, record.name, e);
                result.shows_failed += 1;
            }
        }
    }

    result
}

/// Load `path` into the catalog unless it already holds shows.
/// Returns `None` when the import was skipped.
pub async fn seed_if_empty(pool: &SqlitePool, path: &Path) -> Result<Option<ImportResult>> {
    let existing = catalog::show_count(pool).await?;
    if existing > 0 {
        tracing::debug!("Catalog already has {} shows, skipping seed import", existing);
        return Ok(None);
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let records = parse_seed(&contents)?;

    tracing::info!("Importing {} shows from {}", records.len(), path.display());
    let result = import_records(pool, &records).await;
    tracing::info!(
        "Seed import complete: {} imported, {} failed",
        result.shows_imported,
        result.shows_failed
    );

    Ok(Some(result))
}
