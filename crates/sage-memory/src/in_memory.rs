//! In-memory implementation of [`VectorIndex`] for tests and offline runs.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use crate::error::IndexError;
use crate::index::{ChunkMetadata, ChunkRecord, ScoredChunk, VectorIndex, clamp_distance};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

struct StoredChunk {
    vector: Vec<f32>,
    text: String,
    metadata: ChunkMetadata,
}

/// Brute-force cosine index over a `HashMap`. Mirrors the Qdrant
/// implementation's semantics: upsert overwrites by id, queries come back
/// in ascending distance order, distances are clamped into [0, 1].
pub struct InMemoryIndex {
    chunks: RwLock<HashMap<String, StoredChunk>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryIndex {
    fn ensure_ready(&self, _vector_size: u64) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move { Ok(()) })
    }

    fn upsert(&self, records: Vec<ChunkRecord>) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            let mut chunks = self
                .chunks
                .write()
                .map_err(|e| IndexError::Upsert(e.to_string()))?;
            for record in records {
                chunks.insert(
                    record.id,
                    StoredChunk {
                        vector: record.vector,
                        text: record.text,
                        metadata: record.metadata,
                    },
                );
            }
            Ok(())
        })
    }

    fn query(
        &self,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>, IndexError>> {
        Box::pin(async move {
            let chunks = self
                .chunks
                .read()
                .map_err(|e| IndexError::Query(e.to_string()))?;

            let mut scored: Vec<ScoredChunk> = chunks
                .iter()
                .map(|(id, stored)| ScoredChunk {
                    id: id.clone(),
                    text: stored.text.clone(),
                    metadata: stored.metadata.clone(),
                    distance: clamp_distance(1.0 - cosine_similarity(&vector, &stored.vector)),
                })
                .collect();

            scored.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            scored.truncate(limit);
            Ok(scored)
        })
    }

    fn document_chunk_ids(
        &self,
        document_id: &str,
    ) -> BoxFuture<'_, Result<Vec<String>, IndexError>> {
        let document_id = document_id.to_owned();
        Box::pin(async move {
            let chunks = self
                .chunks
                .read()
                .map_err(|e| IndexError::Scroll(e.to_string()))?;
            Ok(chunks
                .iter()
                .filter(|(_, stored)| stored.metadata.document_id == document_id)
                .map(|(id, _)| id.clone())
                .collect())
        })
    }

    fn delete(&self, ids: Vec<String>) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(());
            }
            let mut chunks = self
                .chunks
                .write()
                .map_err(|e| IndexError::Delete(e.to_string()))?;
            for id in &ids {
                chunks.remove(id);
            }
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, IndexError>> {
        Box::pin(async move {
            let chunks = self
                .chunks
                .read()
                .map_err(|e| IndexError::Count(e.to_string()))?;
            Ok(chunks.len() as u64)
        })
    }
}
