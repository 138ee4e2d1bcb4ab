use anyhow::Result;
use sqlx::SqlitePool;

/// Create the SQLite schema. Idempotent — safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Conversation turns, ordered within a conversation by append time
    // (rowid breaks same-second ties).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            context TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, id)",
    )
    .execute(pool)
    .await?;

    // Generated-content cache for personalization and translation.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_cache (
            kind TEXT NOT NULL,
            variant TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            output TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (kind, variant, content_hash)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
