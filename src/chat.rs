//! Grounded question answering with conversational memory.
//!
//! One [`ChatService::ask`] call walks the whole pipeline: validate input →
//! fuse any selected-text context into the question → retrieve the top-k
//! nearest chunks → generate an answer grounded in them and the prior turns
//! of the conversation → append both turns to memory. Either a complete
//! answer with sources comes back or a typed failure does; no partial
//! answers, and failed queries leave no trace in memory.
//!
//! The service is constructed once at startup with its collaborators behind
//! trait objects and passed by reference — there is no hidden global.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::completion::{ChatMessage, CompletionClient, CompletionOptions};
use crate::embedding::Embedder;
use crate::error::{Result, TomeError};
use crate::index::VectorIndex;
use crate::memory::ConversationMemory;
use crate::models::{ChatAnswer, ConversationTurn, Role, ScoredPoint, SourceRef};

/// Characters of chunk text exposed per source reference.
const PREVIEW_CHARS: usize = 200;

const SYSTEM_PROMPT: &str = "You are a helpful teaching assistant for a textbook on physical AI \
and robotics. Answer the student's question using the textbook excerpts below. Prefer the \
excerpts over your own knowledge; if they do not contain the answer, say so plainly instead of \
guessing.";

/// One question for the chat pipeline.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub question: String,
    /// Text the student selected on the page, folded into the question.
    pub context: Option<String>,
    /// Omitted for a fresh conversation; a new id is generated and returned.
    pub conversation_id: Option<String>,
    /// Overrides the configured top-k when present.
    pub k: Option<usize>,
}

pub struct ChatService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    completion: Arc<dyn CompletionClient>,
    memory: Arc<dyn ConversationMemory>,
    collection: String,
    top_k: usize,
    deadline: Duration,
}

impl ChatService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        completion: Arc<dyn CompletionClient>,
        memory: Arc<dyn ConversationMemory>,
        collection: impl Into<String>,
        top_k: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            completion,
            memory,
            collection: collection.into(),
            top_k,
            deadline,
        }
    }

    /// Answer a question grounded in the indexed textbook.
    ///
    /// Rejects empty questions and `k < 1` before touching any
    /// collaborator. The whole pipeline runs under the configured deadline;
    /// exceeding it yields [`TomeError::Timeout`].
    pub async fn ask(&self, request: ChatRequest) -> Result<ChatAnswer> {
        let question = request.question.trim().to_string();
        if question.is_empty() {
            return Err(TomeError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let k = request.k.unwrap_or(self.top_k);
        if k < 1 {
            return Err(TomeError::InvalidInput("k must be >= 1".to_string()));
        }

        let context = request
            .context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        match tokio::time::timeout(
            self.deadline,
            self.answer(&question, context.as_deref(), &conversation_id, k),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    conversation = %conversation_id,
                    seconds = self.deadline.as_secs(),
                    "chat query deadline exceeded"
                );
                Err(TomeError::Timeout {
                    operation: "chat query".to_string(),
                    seconds: self.deadline.as_secs(),
                })
            }
        }
    }

    async fn answer(
        &self,
        question: &str,
        context: Option<&str>,
        conversation_id: &str,
        k: usize,
    ) -> Result<ChatAnswer> {
        let fused = fuse_question(question, context);

        let query_vector = self.embedder.embed_query(&fused).await?;
        let hits = self.index.search(&self.collection, &query_vector, k).await?;

        let history = self.memory.history(conversation_id).await?;
        let mut messages: Vec<ChatMessage> = history
            .iter()
            .map(|turn| match turn.role {
                Role::User => ChatMessage::user(&turn.text),
                Role::Assistant => ChatMessage::assistant(&turn.text),
            })
            .collect();
        messages.push(ChatMessage::user(&fused));

        let system_prompt = grounded_system_prompt(&hits);
        let answer = self
            .completion
            .complete(&system_prompt, &messages, CompletionOptions::default())
            .await?;

        let sources: Vec<SourceRef> = hits.iter().map(source_ref).collect();

        info!(
            conversation = %conversation_id,
            retrieved = hits.len(),
            context_used = context.is_some(),
            "answered chat query"
        );

        // The exchange is only recorded once generation succeeded, so a
        // failed query leaves history untouched.
        let now = Utc::now();
        self.memory
            .append(ConversationTurn {
                conversation_id: conversation_id.to_string(),
                role: Role::User,
                text: question.to_string(),
                context: context.map(str::to_string),
                created_at: now,
            })
            .await?;
        self.memory
            .append(ConversationTurn {
                conversation_id: conversation_id.to_string(),
                role: Role::Assistant,
                text: answer.clone(),
                context: None,
                created_at: now,
            })
            .await?;

        Ok(ChatAnswer {
            answer,
            sources,
            context_used: context.is_some(),
            conversation_id: conversation_id.to_string(),
        })
    }

    /// Turns recorded for a conversation, oldest first.
    pub async fn history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        self.memory.history(conversation_id).await
    }
}

/// Rewrite the question to reference the supplied selected-text context.
/// The original question is what ends up in history.
fn fuse_question(question: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!("Based on this context: '{ctx}'\n\nQuestion: {question}"),
        None => question.to_string(),
    }
}

/// System prompt carrying the retrieved excerpts as grounding.
fn grounded_system_prompt(hits: &[ScoredPoint]) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("\n\nTextbook excerpts:\n");
    for (i, hit) in hits.iter().enumerate() {
        let title = hit.payload.title.as_deref().unwrap_or("Untitled");
        prompt.push_str(&format!(
            "\n[{n}] {title} ({module})\n{text}\n",
            n = i + 1,
            module = hit.payload.module,
            text = hit.payload.text,
        ));
    }
    prompt
}

/// Project a retrieval hit into provenance with a bounded preview — never
/// the full chunk text.
fn source_ref(hit: &ScoredPoint) -> SourceRef {
    let text = &hit.payload.text;
    let preview = if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.clone()
    };

    SourceRef {
        module: hit.payload.module.clone(),
        title: hit.payload.title.clone(),
        content_preview: preview,
    }
}
