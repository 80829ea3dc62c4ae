use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where a chunk came from. Every chunk of a document carries the same
/// `document_id`; `chunk_index` runs contiguously from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub source: String,
}

/// One chunk ready for indexing. `id` is caller-assigned and stable, so
/// re-ingesting the same content overwrites rather than duplicates.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A retrieval hit. `distance` is `1 - cosine_similarity`, clamped into
/// [0, 1] by the implementation before it leaves the index.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Nearest-neighbor store for chunk embeddings.
///
/// Implementations serialize conflicting writes internally; the callers add
/// no locking of their own. Query results are ordered by ascending distance.
pub trait VectorIndex: Send + Sync {
    /// Create the backing collection if it does not exist. Idempotent.
    fn ensure_ready(&self, vector_size: u64) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Add or overwrite records in one batch.
    fn upsert(&self, records: Vec<ChunkRecord>) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Return up to `limit` nearest chunks, closest first.
    fn query(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>, IndexError>>;

    /// All chunk ids belonging to a document, for cascading delete.
    fn document_chunk_ids(&self, document_id: &str) -> BoxFuture<'_, Result<Vec<String>, IndexError>>;

    /// Remove records by id. A no-op for an empty id list.
    fn delete(&self, ids: Vec<String>) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Total stored chunks.
    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>>;
}

/// Cosine scores can drift slightly outside [0, 1]; reported distances must not.
#[must_use]
pub fn clamp_distance(distance: f32) -> f32 {
    distance.clamp(0.0, 1.0)
}
