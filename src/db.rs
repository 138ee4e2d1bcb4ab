//! SQLite connection and content-cache helpers.
//!
//! SQLite holds conversation history and the personalization/translation
//! caches. The vector index lives in Qdrant; nothing embedding-related is
//! stored here.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::error::TomeError;

pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Look up cached generated content for `(kind, variant, content_hash)`.
///
/// `kind` distinguishes personalization from translation; `variant` is the
/// user level or target language.
pub async fn cache_get(
    pool: &SqlitePool,
    kind: &str,
    variant: &str,
    content_hash: &str,
) -> crate::error::Result<Option<String>> {
    sqlx::query_scalar(
        "SELECT output FROM content_cache WHERE kind = ? AND variant = ? AND content_hash = ?",
    )
    .bind(kind)
    .bind(variant)
    .bind(content_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| TomeError::storage("cache lookup", e))
}

/// Store generated content under `(kind, variant, content_hash)`.
pub async fn cache_put(
    pool: &SqlitePool,
    kind: &str,
    variant: &str,
    content_hash: &str,
    output: &str,
) -> crate::error::Result<()> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO content_cache (kind, variant, content_hash, output, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(kind, variant, content_hash) DO UPDATE SET
            output = excluded.output,
            created_at = excluded.created_at
        "#,
    )
    .bind(kind)
    .bind(variant)
    .bind(content_hash)
    .bind(output)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| TomeError::storage("cache write", e))?;

    Ok(())
}
