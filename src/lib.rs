//! # Tome
//!
//! A retrieval-augmented companion backend for textbook content.
//!
//! Tome ingests markdown chapters, chunks and embeds them into a vector
//! collection, and answers student questions grounded in the retrieved
//! chunks, with per-conversation memory. Chapter personalization and
//! translation ride on the same completion collaborator.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │ docs/*.md│──▶│   Indexer    │──▶│  Qdrant  │
//! │  reader  │   │ chunk+embed  │   │  (HTTP)  │
//! └──────────┘   └──────────────┘   └────┬─────┘
//!                                        │ top-k
//!                ┌──────────────┐        ▼
//!   question ───▶│ ChatService  │◀─ retrieved chunks
//!                │ fuse·ground  │──▶ completion API
//!                └──────┬───────┘
//!                       ▼
//!                 conversation memory (SQLite)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Failure taxonomy |
//! | [`models`] | Core data types |
//! | [`frontmatter`] | Chapter metadata extraction |
//! | [`chunk`] | Separator-priority text chunking |
//! | [`reader`] | Docs directory scanning |
//! | [`embedding`] | Embedding collaborator |
//! | [`index`] | Vector index collaborator |
//! | [`completion`] | Chat completion collaborator |
//! | [`indexer`] | Indexing pipeline |
//! | [`chat`] | Grounded query pipeline |
//! | [`memory`] | Conversation memory |
//! | [`personalize`] | Level-targeted rewriting |
//! | [`translate`] | Chapter translation |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | SQLite connection and caches |
//! | [`migrate`] | Schema creation |

pub mod chat;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod indexer;
pub mod memory;
pub mod migrate;
pub mod models;
pub mod personalize;
pub mod reader;
pub mod server;
pub mod translate;
