//! # Tome CLI
//!
//! The `tome` binary drives the textbook companion backend: indexing
//! chapters into the vector collection, asking grounded questions, and
//! serving the JSON HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! tome --config ./config/tome.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tome init` | Create the SQLite database and schema |
//! | `tome index` | Reindex all chapters (recreates the collection) |
//! | `tome ask "<question>"` | Ask a grounded question |
//! | `tome history <id>` | Print a conversation's turns |
//! | `tome status` | Show vector collection stats |
//! | `tome personalize <file>` | Rewrite a chapter for a reader level |
//! | `tome translate <file>` | Translate a chapter |
//! | `tome serve` | Start the HTTP server |
//!
//! Secrets come from the environment (or a `.env` file): `OPENAI_API_KEY`,
//! `QDRANT_URL`, and optionally `QDRANT_API_KEY`.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tome::chat::{ChatRequest, ChatService};
use tome::completion::{CompletionClient, OpenAiChat};
use tome::config::{load_config, Config};
use tome::embedding::OpenAiEmbedder;
use tome::index::QdrantIndex;
use tome::indexer::Indexer;
use tome::memory::SqliteMemory;
use tome::reader::scan_docs;
use tome::{chunk, db, migrate, personalize, translate};

/// Tome — a retrieval-augmented companion backend for textbook content.
#[derive(Parser)]
#[command(
    name = "tome",
    about = "Tome — a retrieval-augmented companion backend for textbook content",
    version,
    long_about = "Tome ingests markdown chapters, chunks and embeds them into a vector \
    collection, and answers student questions grounded in the retrieved chunks, with \
    per-conversation memory, personalization, and translation."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tome.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the SQLite database schema.
    ///
    /// Creates the conversation history and content cache tables. Running
    /// it multiple times is safe.
    Init,

    /// Reindex all chapters into the vector collection.
    ///
    /// Scans the docs root, chunks every chapter, embeds the chunks, and
    /// submits them in one batch. The collection is deleted and recreated
    /// on every run — there is no incremental mode.
    Index {
        /// Show document and chunk counts without calling any service.
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a question grounded in the indexed textbook.
    Ask {
        /// The question text.
        question: String,

        /// Selected passage to fold into the question.
        #[arg(long)]
        context: Option<String>,

        /// Conversation to continue; omitted starts a new one.
        #[arg(long)]
        conversation: Option<String>,

        /// Number of chunks to retrieve (defaults to retrieval.top_k).
        #[arg(short)]
        k: Option<usize>,
    },

    /// Print the turns of a conversation, oldest first.
    History {
        /// Conversation id as printed by `ask`.
        conversation_id: String,
    },

    /// Show point count and readiness of the vector collection.
    Status,

    /// Rewrite a chapter file for a reader level.
    Personalize {
        /// Path to the chapter markdown file.
        file: PathBuf,

        /// Reader level: beginner, intermediate, or advanced.
        #[arg(long, default_value = "intermediate")]
        level: String,
    },

    /// Translate a chapter file.
    Translate {
        /// Path to the chapter markdown file.
        file: PathBuf,

        /// Target language code.
        #[arg(long, default_value = translate::DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Start the JSON HTTP server.
    Serve,

    /// Generate shell completions.
    Completions {
        /// Shell to generate for.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "tome", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.db.path).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Index { dry_run } => {
            run_index(&cfg, dry_run).await?;
        }
        Commands::Ask {
            question,
            context,
            conversation,
            k,
        } => {
            run_ask(&cfg, question, context, conversation, k).await?;
        }
        Commands::History { conversation_id } => {
            run_history(&cfg, &conversation_id).await?;
        }
        Commands::Status => {
            let indexer = build_indexer(&cfg)?;
            let stats = indexer.collection_status().await?;
            println!("collection: {}", stats.collection);
            println!("  points: {}", stats.points);
            println!("  status: {}", stats.status);
        }
        Commands::Personalize { file, level } => {
            let content = std::fs::read_to_string(&file)?;
            let pool = connect_db(&cfg).await?;
            let completion = build_completion(&cfg)?;
            let rewritten =
                personalize::personalize(completion.as_ref(), &pool, &content, &level).await?;
            pool.close().await;
            println!("{rewritten}");
        }
        Commands::Translate { file, language } => {
            let content = std::fs::read_to_string(&file)?;
            let pool = connect_db(&cfg).await?;
            let completion = build_completion(&cfg)?;
            let translated =
                translate::translate(completion.as_ref(), &pool, &content, &language).await?;
            pool.close().await;
            println!("{translated}");
        }
        Commands::Serve => {
            run_serve(&cfg).await?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

async fn connect_db(cfg: &Config) -> Result<sqlx::SqlitePool> {
    let pool = db::connect(&cfg.db.path).await?;
    migrate::run_migrations(&pool).await?;
    Ok(pool)
}

fn build_indexer(cfg: &Config) -> Result<Indexer> {
    let embedder = Arc::new(OpenAiEmbedder::new(&cfg.embedding)?);
    let index = Arc::new(QdrantIndex::from_env()?);
    Ok(Indexer::new(
        embedder,
        index,
        cfg.qdrant.collection.clone(),
        cfg.chunking.chunk_size,
        cfg.chunking.chunk_overlap,
    ))
}

fn build_completion(cfg: &Config) -> Result<Arc<dyn CompletionClient>> {
    Ok(Arc::new(OpenAiChat::new(&cfg.chat)?))
}

fn build_chat(cfg: &Config, pool: sqlx::SqlitePool) -> Result<Arc<ChatService>> {
    let embedder = Arc::new(OpenAiEmbedder::new(&cfg.embedding)?);
    let index = Arc::new(QdrantIndex::from_env()?);
    let completion = Arc::new(OpenAiChat::new(&cfg.chat)?);
    let memory = Arc::new(SqliteMemory::new(pool));

    Ok(Arc::new(ChatService::new(
        embedder,
        index,
        completion,
        memory,
        cfg.qdrant.collection.clone(),
        cfg.retrieval.top_k,
        Duration::from_secs(cfg.retrieval.deadline_secs),
    )))
}

async fn run_index(cfg: &Config, dry_run: bool) -> Result<()> {
    let scan = scan_docs(&cfg.docs)?;

    if dry_run {
        let total_chunks: usize = scan
            .documents
            .iter()
            .map(|doc| {
                let (_, body) = tome::frontmatter::parse(&doc.body);
                chunk::split_text(body, cfg.chunking.chunk_size, cfg.chunking.chunk_overlap).len()
            })
            .sum();
        println!("index (dry-run)");
        println!("  documents found: {}", scan.documents.len());
        println!("  unreadable: {}", scan.failures.len());
        println!("  estimated chunks: {}", total_chunks);
        return Ok(());
    }

    let indexer = build_indexer(cfg)?;
    let report = indexer.run_index(scan).await?;

    println!("index {}", cfg.qdrant.collection);
    println!("  documents indexed: {}", report.documents_indexed);
    println!("  documents failed: {}", report.documents_failed);
    println!("  chunks indexed: {}", report.chunks_indexed);
    println!("ok");
    Ok(())
}

async fn run_ask(
    cfg: &Config,
    question: String,
    context: Option<String>,
    conversation: Option<String>,
    k: Option<usize>,
) -> Result<()> {
    let pool = connect_db(cfg).await?;
    let chat = build_chat(cfg, pool.clone())?;

    let answer = chat
        .ask(ChatRequest {
            question,
            context,
            conversation_id: conversation,
            k,
        })
        .await?;

    println!("{}", answer.answer);
    println!();
    for (i, source) in answer.sources.iter().enumerate() {
        let title = source.title.as_deref().unwrap_or("(untitled)");
        println!("[{}] {} / {}", i + 1, source.module, title);
        println!("    \"{}\"", source.content_preview.replace('\n', " "));
    }
    println!();
    println!("conversation: {}", answer.conversation_id);

    pool.close().await;
    Ok(())
}

async fn run_history(cfg: &Config, conversation_id: &str) -> Result<()> {
    let pool = connect_db(cfg).await?;
    let memory = SqliteMemory::new(pool.clone());

    use tome::memory::ConversationMemory;
    let turns = memory.history(conversation_id).await?;
    if turns.is_empty() {
        println!("No turns for conversation {}", conversation_id);
    }
    for turn in turns {
        println!(
            "[{}] {}: {}",
            turn.created_at.format("%Y-%m-%d %H:%M:%S"),
            turn.role.as_str(),
            turn.text
        );
    }

    pool.close().await;
    Ok(())
}

async fn run_serve(cfg: &Config) -> Result<()> {
    let pool = connect_db(cfg).await?;
    let chat = build_chat(cfg, pool.clone())?;
    let indexer = Arc::new(build_indexer(cfg)?);
    let completion = build_completion(cfg)?;

    tome::server::run_server(&cfg.server.bind, chat, indexer, completion, pool).await
}
