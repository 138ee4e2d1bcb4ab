//! Core data models used throughout Tome.
//!
//! These types represent the documents, chunks, conversation turns, and
//! answers that flow through the indexing and query pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata attached to a document, inherited by every chunk cut from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    /// Chapter title, from frontmatter or the first `# ` heading.
    pub title: Option<String>,
    /// Sidebar ordering, from frontmatter.
    pub order: Option<i64>,
    /// Module name derived from the source path (e.g. `module-1-ros2`).
    pub module: String,
    /// Path relative to the docs root. Doubles as the document identity.
    pub source_path: String,
}

/// A source document read from the docs directory.
///
/// Immutable once read; identity is the relative source path.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub body: String,
    pub meta: DocumentMeta,
}

/// A bounded span of a document's body, the unit of embedding and retrieval.
///
/// `index` reflects left-to-right position in the original body and is
/// stable across runs for identical input.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub document_id: String,
    pub index: usize,
    pub total_in_document: usize,
    pub text: String,
}

/// Payload stored with every point in the vector index.
///
/// This is what retrieval gets back alongside the similarity score; the
/// query pipeline projects it into [`SourceRef`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub module: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    pub source: String,
    pub chunk_id: usize,
    pub total_chunks: usize,
}

/// A point submitted to the vector index: vector plus chunk payload.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A retrieval hit: payload plus the index-reported relevance score.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub payload: ChunkPayload,
    pub score: f32,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One question/answer turn in a conversation, ordered by append time.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub conversation_id: String,
    pub role: Role,
    pub text: String,
    /// Selected-text context the user attached to the question, if any.
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Provenance for one retrieved chunk, with a bounded text preview.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub module: String,
    pub title: Option<String>,
    pub content_preview: String,
}

/// A complete grounded answer. Produced fresh per query; either the whole
/// thing is returned or the query fails — never a partial answer.
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub context_used: bool,
    pub conversation_id: String,
}

/// Outcome of one indexing run.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub chunks_indexed: usize,
}

/// Point count and readiness of the vector index collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    pub points: u64,
    pub status: String,
}
