//! Indexing pipeline orchestration.
//!
//! Coordinates the full reindex flow: scan outcome → frontmatter → chunking
//! → per-chunk metadata → one batched embed-and-upsert submission.
//!
//! # Reindex policy
//!
//! Every run **recreates** the target collection: an existing collection is
//! deleted and a fresh one created before any points are submitted. There is
//! no incremental mode — re-running indexing can never silently duplicate
//! content, at the cost of a window where the collection is empty. A failure
//! while embedding or submitting aborts the whole run; per-document read
//! failures only skip that document.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunk::split_text;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::frontmatter;
use crate::index::VectorIndex;
use crate::models::{Chunk, ChunkPayload, CollectionStats, IndexPoint, IndexReport};
use crate::reader::ScanOutcome;

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            collection: collection.into(),
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunk and index every document in the scan outcome.
    ///
    /// Recreates the collection (see the module-level reindex policy), then
    /// submits all chunks across all documents in one batch. Documents the
    /// scan failed to read are counted as `documents_failed`.
    pub async fn run_index(&self, scan: ScanOutcome) -> Result<IndexReport> {
        for failure in &scan.failures {
            warn!(error = %failure, "skipping unreadable document");
        }

        let mut points: Vec<IndexPoint> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        let mut documents_indexed = 0usize;

        for doc in &scan.documents {
            let (meta, body) = frontmatter::parse(&doc.body);
            let title = meta.title.or_else(|| doc.meta.title.clone());
            let order = meta.order.or(doc.meta.order);

            let windows = split_text(body, self.chunk_size, self.chunk_overlap);
            let total = windows.len();
            let chunks = windows.into_iter().enumerate().map(|(index, text)| Chunk {
                document_id: doc.id.clone(),
                index,
                total_in_document: total,
                text,
            });

            for chunk in chunks {
                points.push(IndexPoint {
                    id: Uuid::new_v4().to_string(),
                    vector: Vec::new(),
                    payload: ChunkPayload {
                        text: chunk.text.clone(),
                        module: doc.meta.module.clone(),
                        title: title.clone(),
                        order,
                        source: doc.meta.source_path.clone(),
                        chunk_id: chunk.index,
                        total_chunks: chunk.total_in_document,
                    },
                });
                texts.push(chunk.text);
            }

            documents_indexed += 1;
        }

        info!(
            documents = documents_indexed,
            failed = scan.failures.len(),
            chunks = points.len(),
            collection = %self.collection,
            "indexing"
        );

        let vectors = self.embedder.embed_batch(&texts).await?;
        for (point, vector) in points.iter_mut().zip(vectors) {
            point.vector = vector;
        }

        // Full-reindex policy: drop and recreate before submitting.
        if self.index.collection_exists(&self.collection).await? {
            self.index.delete_collection(&self.collection).await?;
        }
        self.index
            .create_collection(&self.collection, self.embedder.dims())
            .await?;

        let chunks_indexed = points.len();
        if !points.is_empty() {
            self.index.upsert(&self.collection, points).await?;
        }

        Ok(IndexReport {
            documents_indexed,
            documents_failed: scan.failures.len(),
            chunks_indexed,
        })
    }

    /// Point count and readiness of the target collection.
    pub async fn collection_status(&self) -> Result<CollectionStats> {
        self.index.collection_stats(&self.collection).await
    }
}
