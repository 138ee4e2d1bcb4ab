//! JSON HTTP API for the companion frontend.
//!
//! Exposes the chat, personalization, translation, and index-status
//! operations over axum. Authentication is out of scope here — the API sits
//! behind the platform's own gateway.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/api/chat/query` | Grounded chatbot query |
//! | `GET`  | `/api/chat/history` | Turns for one conversation |
//! | `POST` | `/api/personalize` | Rewrite chapter content for a level |
//! | `POST` | `/api/translate` | Translate chapter content |
//! | `GET`  | `/api/index/status` | Vector collection stats |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "invalid_input", "message": "question must not be empty" } }
//! ```
//!
//! Collaborator unavailability maps to 502, timeouts to 408, bad input to
//! 400, and a missing collection to 404.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::chat::{ChatRequest, ChatService};
use crate::completion::CompletionClient;
use crate::error::TomeError;
use crate::indexer::Indexer;
use crate::models::{ChatAnswer, ConversationTurn};
use crate::{personalize, translate};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    chat: Arc<ChatService>,
    indexer: Arc<Indexer>,
    completion: Arc<dyn CompletionClient>,
    pool: SqlitePool,
}

/// Start the HTTP server on `bind`. Runs until the process is terminated.
pub async fn run_server(
    bind: &str,
    chat: Arc<ChatService>,
    indexer: Arc<Indexer>,
    completion: Arc<dyn CompletionClient>,
    pool: SqlitePool,
) -> anyhow::Result<()> {
    let state = AppState {
        chat,
        indexer,
        completion,
        pool,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/chat/query", post(handle_chat_query))
        .route("/api/chat/history", get(handle_chat_history))
        .route("/api/personalize", post(handle_personalize))
        .route("/api/translate", post(handle_translate))
        .route("/api/index/status", get(handle_index_status))
        .layer(cors)
        .with_state(state);

    println!("tome server listening on http://{}", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TomeError> for AppError {
    fn from(err: TomeError) -> Self {
        let status = match &err {
            TomeError::InvalidInput(_) | TomeError::Parse { .. } => StatusCode::BAD_REQUEST,
            TomeError::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            TomeError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            TomeError::EmbeddingUnavailable { .. }
            | TomeError::IndexUnavailable { .. }
            | TomeError::CompletionUnavailable { .. } => StatusCode::BAD_GATEWAY,
            TomeError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/chat/query ============

#[derive(Deserialize)]
struct ChatQueryBody {
    query: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    k: Option<usize>,
}

#[derive(Serialize)]
struct ChatQueryResponse {
    response: String,
    sources: Vec<crate::models::SourceRef>,
    context_used: bool,
    conversation_id: String,
}

impl From<ChatAnswer> for ChatQueryResponse {
    fn from(answer: ChatAnswer) -> Self {
        Self {
            response: answer.answer,
            sources: answer.sources,
            context_used: answer.context_used,
            conversation_id: answer.conversation_id,
        }
    }
}

async fn handle_chat_query(
    State(state): State<AppState>,
    Json(body): Json<ChatQueryBody>,
) -> Result<Json<ChatQueryResponse>, AppError> {
    let answer = state
        .chat
        .ask(ChatRequest {
            question: body.query,
            context: body.context,
            conversation_id: body.conversation_id,
            k: body.k,
        })
        .await?;

    Ok(Json(answer.into()))
}

// ============ GET /api/chat/history ============

#[derive(Deserialize)]
struct HistoryParams {
    conversation_id: String,
}

#[derive(Serialize)]
struct HistoryResponse {
    conversation_id: String,
    messages: Vec<ConversationTurn>,
}

async fn handle_chat_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, AppError> {
    let messages = state.chat.history(&params.conversation_id).await?;
    Ok(Json(HistoryResponse {
        conversation_id: params.conversation_id,
        messages,
    }))
}

// ============ POST /api/personalize ============

#[derive(Deserialize)]
struct PersonalizeBody {
    content: String,
    user_level: String,
    #[serde(default)]
    chapter: Option<String>,
}

#[derive(Serialize)]
struct PersonalizeResponse {
    personalized_content: String,
    user_level: String,
    chapter: Option<String>,
}

async fn handle_personalize(
    State(state): State<AppState>,
    Json(body): Json<PersonalizeBody>,
) -> Result<Json<PersonalizeResponse>, AppError> {
    let personalized = personalize::personalize(
        state.completion.as_ref(),
        &state.pool,
        &body.content,
        &body.user_level,
    )
    .await?;

    Ok(Json(PersonalizeResponse {
        personalized_content: personalized,
        user_level: body.user_level,
        chapter: body.chapter,
    }))
}

// ============ POST /api/translate ============

#[derive(Deserialize)]
struct TranslateBody {
    content: String,
    #[serde(default = "default_language")]
    target_language: String,
}

fn default_language() -> String {
    translate::DEFAULT_LANGUAGE.to_string()
}

#[derive(Serialize)]
struct TranslateResponse {
    translated_content: String,
    target_language: String,
}

async fn handle_translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<TranslateResponse>, AppError> {
    let translated = translate::translate(
        state.completion.as_ref(),
        &state.pool,
        &body.content,
        &body.target_language,
    )
    .await?;

    Ok(Json(TranslateResponse {
        translated_content: translated,
        target_language: body.target_language,
    }))
}

// ============ GET /api/index/status ============

async fn handle_index_status(
    State(state): State<AppState>,
) -> Result<Json<crate::models::CollectionStats>, AppError> {
    let stats = state.indexer.collection_status().await?;
    Ok(Json(stats))
}
