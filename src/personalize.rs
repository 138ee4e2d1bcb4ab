//! Chapter personalization: rewrite content for the reader's level.
//!
//! The completion client does the rewriting; results are cached in SQLite
//! keyed by `(level, content hash)` so re-requesting the same chapter at the
//! same level costs nothing.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;

use crate::completion::{ChatMessage, CompletionClient, CompletionOptions};
use crate::db;
use crate::error::{Result, TomeError};

pub const LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

const CACHE_KIND: &str = "personalize";

fn level_prompt(level: &str) -> &'static str {
    match level {
        "beginner" => {
            "Rewrite this robotics content for absolute beginners. Use simple language, add \
             detailed explanations, include analogies, break down complex concepts \
             step-by-step. Assume no prior robotics knowledge."
        }
        "advanced" => {
            "Rewrite this robotics content for advanced practitioners. Focus on optimization, \
             advanced techniques, best practices, and production considerations. Be concise \
             and technical."
        }
        _ => {
            "Rewrite this robotics content for intermediate learners. Focus on practical \
             examples, real-world applications, and hands-on implementation. Assume basic \
             programming and robotics knowledge."
        }
    }
}

/// Rewrite `content` for `level`. Unknown levels fall back to intermediate.
pub async fn personalize(
    completion: &dyn CompletionClient,
    pool: &SqlitePool,
    content: &str,
    level: &str,
) -> Result<String> {
    if content.trim().is_empty() {
        return Err(TomeError::InvalidInput(
            "content must not be empty".to_string(),
        ));
    }

    let level = if LEVELS.contains(&level) {
        level
    } else {
        "intermediate"
    };

    let hash = content_hash(content);
    if let Some(cached) = db::cache_get(pool, CACHE_KIND, level, &hash).await? {
        info!(level, "personalization cache hit");
        return Ok(cached);
    }

    let rewritten = completion
        .complete(
            level_prompt(level),
            &[ChatMessage::user(format!("Content to adapt:\n\n{content}"))],
            CompletionOptions {
                temperature: Some(0.7),
                max_tokens: Some(1500),
            },
        )
        .await?;

    db::cache_put(pool, CACHE_KIND, level, &hash, &rewritten).await?;
    Ok(rewritten)
}

pub(crate) fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
