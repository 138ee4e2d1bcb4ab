//! Vector index collaborator: trait, Qdrant-backed implementation, and an
//! in-memory implementation for tests.
//!
//! The core never inspects collaborator-internal state; everything it needs
//! is behind [`VectorIndex`]. Collections are created with cosine distance
//! to match the embedding model's geometry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{Result, TomeError};
use crate::models::{ChunkPayload, CollectionStats, IndexPoint, ScoredPoint};

/// Nearest-neighbor index over embedded chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn create_collection(&self, name: &str, dims: usize) -> Result<()>;

    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Submit a batch of points. The whole batch lands or the call fails;
    /// the index never acknowledges a partial write.
    async fn upsert(&self, name: &str, points: Vec<IndexPoint>) -> Result<()>;

    /// Top-`k` nearest points for `vector`, ordered by descending relevance
    /// as reported by the index.
    async fn search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>>;

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats>;
}

// ============ Qdrant (REST) ============

/// Vector index backed by a Qdrant instance, spoken to over its REST API.
///
/// Reads `QDRANT_URL` (required) and `QDRANT_API_KEY` (optional) from the
/// environment.
pub struct QdrantIndex {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl QdrantIndex {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("QDRANT_URL")
            .map_err(|_| anyhow::anyhow!("QDRANT_URL environment variable not set"))?;
        let api_key = std::env::var("QDRANT_API_KEY").ok();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    fn unavailable(operation: &str, reason: impl std::fmt::Display) -> TomeError {
        TomeError::IndexUnavailable {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Send a request, mapping transport and HTTP failures to index errors.
    /// A 404 is reported as `CollectionNotFound` for `collection`.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
        collection: &str,
    ) -> Result<serde_json::Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| Self::unavailable(operation, e))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(TomeError::CollectionNotFound(collection.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::unavailable(operation, format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Self::unavailable(operation, e))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let json = self
            .send(
                self.request(reqwest::Method::GET, &format!("/collections/{name}/exists")),
                "collection exists",
                name,
            )
            .await?;
        Ok(json["result"]["exists"].as_bool().unwrap_or(false))
    }

    async fn create_collection(&self, name: &str, dims: usize) -> Result<()> {
        let body = serde_json::json!({
            "vectors": { "size": dims, "distance": "Cosine" }
        });
        self.send(
            self.request(reqwest::Method::PUT, &format!("/collections/{name}")).json(&body),
            "create collection",
            name,
        )
        .await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.send(
            self.request(reqwest::Method::DELETE, &format!("/collections/{name}")),
            "delete collection",
            name,
        )
        .await?;
        Ok(())
    }

    async fn upsert(&self, name: &str, points: Vec<IndexPoint>) -> Result<()> {
        let body = serde_json::json!({
            "points": points
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "id": p.id,
                        "vector": p.vector,
                        "payload": p.payload,
                    })
                })
                .collect::<Vec<_>>(),
        });

        self.send(
            self.request(
                reqwest::Method::PUT,
                &format!("/collections/{name}/points?wait=true"),
            )
            .json(&body),
            "upsert points",
            name,
        )
        .await?;
        Ok(())
    }

    async fn search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        let body = serde_json::json!({
            "vector": vector,
            "limit": k,
            "with_payload": true,
        });

        let json = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/collections/{name}/points/search"),
                )
                .json(&body),
                "search",
                name,
            )
            .await?;

        let hits = json["result"].as_array().cloned().unwrap_or_default();
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let payload: ChunkPayload = serde_json::from_value(hit["payload"].clone())
                .map_err(|e| Self::unavailable("search", format!("bad payload: {e}")))?;
            let score = hit["score"].as_f64().unwrap_or(0.0) as f32;
            results.push(ScoredPoint { payload, score });
        }
        Ok(results)
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let json = self
            .send(
                self.request(reqwest::Method::GET, &format!("/collections/{name}")),
                "collection stats",
                name,
            )
            .await?;

        Ok(CollectionStats {
            collection: name.to_string(),
            points: json["result"]["points_count"].as_u64().unwrap_or(0),
            status: json["result"]["status"].as_str().unwrap_or("unknown").to_string(),
        })
    }
}

// ============ In-memory ============

struct MemoryCollection {
    dims: usize,
    points: Vec<IndexPoint>,
}

/// Brute-force in-memory index for tests: cosine similarity over all stored
/// vectors.
#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().unwrap().contains_key(name))
    }

    async fn create_collection(&self, name: &str, dims: usize) -> Result<()> {
        self.collections.write().unwrap().insert(
            name.to_string(),
            MemoryCollection {
                dims,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().unwrap().remove(name);
        Ok(())
    }

    async fn upsert(&self, name: &str, points: Vec<IndexPoint>) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| TomeError::CollectionNotFound(name.to_string()))?;
        for point in points {
            if point.vector.len() != collection.dims {
                return Err(TomeError::IndexUnavailable {
                    operation: "upsert points".to_string(),
                    reason: format!(
                        "vector dimension mismatch: expected {}, got {}",
                        collection.dims,
                        point.vector.len()
                    ),
                });
            }
            collection.points.retain(|p| p.id != point.id);
            collection.points.push(point);
        }
        Ok(())
    }

    async fn search(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| TomeError::CollectionNotFound(name.to_string()))?;

        let mut scored: Vec<ScoredPoint> = collection
            .points
            .iter()
            .map(|p| ScoredPoint {
                payload: p.payload.clone(),
                score: cosine_similarity(vector, &p.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collections = self.collections.read().unwrap();
        let collection = collections
            .get(name)
            .ok_or_else(|| TomeError::CollectionNotFound(name.to_string()))?;
        Ok(CollectionStats {
            collection: name.to_string(),
            points: collection.points.len() as u64,
            status: "green".to_string(),
        })
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
