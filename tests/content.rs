//! Personalization and translation tests: prompt selection, caching, and
//! input bounds, over a scripted completion client and a scratch SQLite
//! database.

use async_trait::async_trait;
use std::sync::Mutex;
use tempfile::TempDir;

use tome::completion::{ChatMessage, CompletionClient, CompletionOptions};
use tome::error::Result as TomeResult;
use tome::{db, migrate, personalize, translate};

/// Completion client that returns a canned answer and records every call.
struct ScriptedCompletion {
    answer: String,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedCompletion {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> (String, Vec<ChatMessage>) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        _opts: CompletionOptions,
    ) -> TomeResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), messages.to_vec()));
        Ok(self.answer.clone())
    }
}

async fn scratch_pool() -> (TempDir, sqlx::SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let pool = db::connect(&tmp.path().join("tome.sqlite")).await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (tmp, pool)
}

#[tokio::test]
async fn test_personalize_cache_hit_skips_completion() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("Simplified chapter.");

    let first = personalize::personalize(&completion, &pool, "A node is a process.", "beginner")
        .await
        .unwrap();
    let second = personalize::personalize(&completion, &pool, "A node is a process.", "beginner")
        .await
        .unwrap();

    assert_eq!(first, "Simplified chapter.");
    assert_eq!(first, second);
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn test_personalize_levels_cached_separately() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("Rewritten.");

    personalize::personalize(&completion, &pool, "Same content.", "beginner")
        .await
        .unwrap();
    personalize::personalize(&completion, &pool, "Same content.", "advanced")
        .await
        .unwrap();

    assert_eq!(completion.call_count(), 2);
}

#[tokio::test]
async fn test_personalize_unknown_level_uses_intermediate_prompt() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("Rewritten.");

    personalize::personalize(&completion, &pool, "Some content.", "wizard")
        .await
        .unwrap();

    let (system, messages) = completion.last_call();
    assert!(system.contains("intermediate learners"));
    assert!(messages[0].content.contains("Some content."));
}

#[tokio::test]
async fn test_personalize_rejects_empty_content() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("unused");

    let err = personalize::personalize(&completion, &pool, "   ", "beginner")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn test_translate_cache_hit_skips_completion() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("ترجمہ شدہ متن");

    let first = translate::translate(&completion, &pool, "Nodes talk over topics.", "ur")
        .await
        .unwrap();
    let second = translate::translate(&completion, &pool, "Nodes talk over topics.", "ur")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn test_translate_prompt_names_language() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("translated");

    translate::translate(&completion, &pool, "Short chapter.", "ur")
        .await
        .unwrap();

    let (system, messages) = completion.last_call();
    assert!(system.contains("Urdu"));
    assert!(messages[0].content.starts_with("Translate to Urdu:"));
}

#[tokio::test]
async fn test_translate_bounds_long_input() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("translated");

    let long = "word ".repeat(4000); // 20k chars
    translate::translate(&completion, &pool, &long, "ur").await.unwrap();

    let (_system, messages) = completion.last_call();
    // "Translate to Urdu:\n\n" prefix plus at most 8000 content chars.
    assert!(messages[0].content.chars().count() <= 8000 + 40);
}

#[tokio::test]
async fn test_translate_rejects_empty_language() {
    let (_tmp, pool) = scratch_pool().await;
    let completion = ScriptedCompletion::new("unused");

    let err = translate::translate(&completion, &pool, "content", " ")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    assert_eq!(completion.call_count(), 0);
}
