use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::models::ApiKey;

/// Keys are issued as lowercase or uppercase UUID v4 strings
static API_KEY_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$")
        .unwrap()
});

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("API key required - POST /api-key to generate one")]
    Missing,

    #[error("Invalid API key format")]
    InvalidFormat,

    #[error("Invalid API key")]
    Unknown,

    #[error("API key has been revoked")]
    Revoked,

    #[error("invalid '{field}': {reason}")]
    InvalidRequest { field: &'static str, reason: &'static str },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct IssuedKey {
    pub api_key: String,
    pub name: String,
    pub created_at: String,
    pub usage: String,
}

pub fn is_valid_format(key: &str) -> bool {
    API_KEY_FORMAT.is_match(key)
}

/// Store a fresh active key for `name`
pub async fn issue(
    pool: &SqlitePool,
    name: &str,
    email: Option<&str>,
) -> Result<IssuedKey, ApiKeyError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiKeyError::InvalidRequest {
            field: "name",
            reason: "must be between 1 and 255 characters",
        });
    }

    let email = email.map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        if !email.contains('@') || email.len() > MAX_NAME_LEN {
            return Err(ApiKeyError::InvalidRequest {
                field: "email",
                reason: "must be a valid email address",
            });
        }
    }

    let api_key = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO api_keys (api_key, name, email, is_active, created_at, request_count) VALUES (?, ?, ?, 1, ?, 0)",
    )
    .bind(&api_key)
    .bind(name)
    .bind(email)
    .bind(&created_at)
    .execute(pool)
    .await?;

    tracing::info!("Issued API key for '{}'", name);

    Ok(IssuedKey {
        usage: format!(
            "Include this key in the X-API-Key header: curl -H \"X-API-Key: {}\"",
            api_key
        ),
        api_key,
        name: name.to_string(),
        created_at,
    })
}

/// Check a presented key and record the use. Format is checked before any
/// database lookup.
pub async fn authenticate(pool: &SqlitePool, presented: Option<&str>) -> Result<ApiKey, ApiKeyError> {
    let key = presented.map(str::trim).filter(|k| !k.is_empty()).ok_or(ApiKeyError::Missing)?;

    if !is_valid_format(key) {
        return Err(ApiKeyError::InvalidFormat);
    }

    let record: ApiKey = sqlx::query_as("SELECT * FROM api_keys WHERE api_key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiKeyError::Unknown)?;

    if !record.is_active {
        return Err(ApiKeyError::Revoked);
    }

    sqlx::query(
        "UPDATE api_keys SET last_used_at = ?, request_count = request_count + 1 WHERE id = ?",
    )
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(record)
}
