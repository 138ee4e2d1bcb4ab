//! Chapter translation via the completion client.
//!
//! Technical terms stay in English; the default target language is Urdu.
//! Results are cached in SQLite keyed by `(language, content hash)`. Input
//! is bounded to 8000 characters per request to balance quality and cost.

use sqlx::SqlitePool;
use tracing::info;

use crate::completion::{ChatMessage, CompletionClient, CompletionOptions};
use crate::db;
use crate::error::{Result, TomeError};
use crate::personalize::content_hash;

pub const DEFAULT_LANGUAGE: &str = "ur";

const CACHE_KIND: &str = "translate";
const MAX_INPUT_CHARS: usize = 8000;

fn translator_prompt(language: &str) -> String {
    format!(
        "You are a professional translator specializing in technical content. Translate the \
         following robotics and AI content to {language}. Maintain technical terms in English \
         where appropriate (like 'ROS 2', 'Python', 'SLAM'). Ensure the translation is natural \
         and clear for learners reading in {language}."
    )
}

/// Display name for the language codes the platform ships with; other codes
/// are passed through as-is.
fn language_name(code: &str) -> &str {
    match code {
        "ur" => "Urdu",
        other => other,
    }
}

/// Translate `content` to `target_language`.
pub async fn translate(
    completion: &dyn CompletionClient,
    pool: &SqlitePool,
    content: &str,
    target_language: &str,
) -> Result<String> {
    if content.trim().is_empty() {
        return Err(TomeError::InvalidInput(
            "content must not be empty".to_string(),
        ));
    }
    if target_language.trim().is_empty() {
        return Err(TomeError::InvalidInput(
            "target language must not be empty".to_string(),
        ));
    }

    let bounded = bound_input(content);
    let hash = content_hash(bounded);
    if let Some(cached) = db::cache_get(pool, CACHE_KIND, target_language, &hash).await? {
        info!(language = target_language, "translation cache hit");
        return Ok(cached);
    }

    let language = language_name(target_language);
    let translated = completion
        .complete(
            &translator_prompt(language),
            &[ChatMessage::user(format!(
                "Translate to {language}:\n\n{bounded}"
            ))],
            CompletionOptions {
                temperature: Some(0.3),
                max_tokens: Some(4000),
            },
        )
        .await?;

    db::cache_put(pool, CACHE_KIND, target_language, &hash, &translated).await?;
    Ok(translated)
}

/// Truncate to the per-request input bound at a character boundary.
fn bound_input(content: &str) -> &str {
    match content.char_indices().nth(MAX_INPUT_CHARS) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}
