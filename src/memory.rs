//! Conversation memory: an append-only turn log keyed by conversation id.
//!
//! Memory for one conversation never leaks into another; reading an unknown
//! id yields an empty sequence. Appends are atomic per key, so concurrent
//! queries on different conversations cannot corrupt each other's turn
//! order.
//!
//! Two implementations: [`InMemoryMemory`] (process lifetime) and
//! [`SqliteMemory`] (survives restarts).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Result, TomeError};
use crate::models::{ConversationTurn, Role};

/// Keyed, append-only store of conversation turns.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Append one turn to its conversation's log.
    async fn append(&self, turn: ConversationTurn) -> Result<()>;

    /// All turns for a conversation, ordered by append time. Unknown ids
    /// yield an empty vec.
    async fn history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>>;
}

// ============ In-memory ============

/// Process-lifetime conversation memory behind a single `RwLock`.
#[derive(Default)]
pub struct InMemoryMemory {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryMemory {
    async fn append(&self, turn: ConversationTurn) -> Result<()> {
        let mut turns = self.turns.write().unwrap();
        turns
            .entry(turn.conversation_id.clone())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        let turns = self.turns.read().unwrap();
        Ok(turns.get(conversation_id).cloned().unwrap_or_default())
    }
}

// ============ SQLite ============

/// Conversation memory persisted to the `messages` table.
pub struct SqliteMemory {
    pool: SqlitePool,
}

impl SqliteMemory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationMemory for SqliteMemory {
    async fn append(&self, turn: ConversationTurn) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, role, content, context, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&turn.conversation_id)
        .bind(turn.role.as_str())
        .bind(&turn.text)
        .bind(&turn.context)
        .bind(turn.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| TomeError::storage("append turn", e))?;

        Ok(())
    }

    async fn history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT conversation_id, role, content, context, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TomeError::storage("read history", e))?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in rows {
            let role_str: String = row.get("role");
            let role = Role::parse(&role_str).ok_or_else(|| {
                TomeError::storage("read history", format!("unknown role '{role_str}'"))
            })?;
            let created_at: i64 = row.get("created_at");
            turns.push(ConversationTurn {
                conversation_id: row.get("conversation_id"),
                role,
                text: row.get("content"),
                context: row.get("context"),
                created_at: DateTime::<Utc>::from_timestamp(created_at, 0)
                    .unwrap_or_else(Utc::now),
            });
        }
        Ok(turns)
    }
}
