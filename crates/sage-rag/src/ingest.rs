//! Document ingestion: extract, chunk, embed, index.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use sage_llm::ModelClient;
use sage_memory::{ChunkMetadata, ChunkRecord, VectorIndex};

use crate::chunker::{ChunkerConfig, chunk_text};
use crate::error::RagError;
use crate::extract::extract_pdf_bytes;

/// Content-addressed document id: documents with identical bytes ingest to
/// the same id, so re-uploading overwrites instead of duplicating.
#[must_use]
pub fn document_id(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex()[..16].to_string()
}

/// Stable per-chunk point id. Qdrant only accepts UUIDs or integers as point
/// ids, so the `document_id:index` pair is hashed into a v5 UUID.
#[must_use]
pub fn chunk_point_id(document_id: &str, chunk_index: usize) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{document_id}:{chunk_index}").as_bytes(),
    )
    .to_string()
}

/// Summary of one completed ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunk_count: usize,
    pub total_characters: usize,
}

/// Drives a document from raw PDF bytes to indexed chunks.
pub struct IngestionPipeline {
    model: Arc<dyn ModelClient>,
    index: Arc<dyn VectorIndex>,
    chunker: ChunkerConfig,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(
        model: Arc<dyn ModelClient>,
        index: Arc<dyn VectorIndex>,
        chunker: ChunkerConfig,
    ) -> Self {
        Self {
            model,
            index,
            chunker,
        }
    }

    /// Ingests a PDF: extracts its text, then chunks, embeds, and indexes it.
    ///
    /// `source` is the stored file path recorded in chunk metadata.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        source: &str,
    ) -> Result<IngestReport, RagError> {
        let doc_id = document_id(&bytes);
        let text = extract_pdf_bytes(bytes).await?;
        self.ingest_text(&doc_id, &text, filename, source).await
    }

    /// Chunks, embeds, and indexes already-extracted text under `doc_id`.
    pub async fn ingest_text(
        &self,
        doc_id: &str,
        text: &str,
        filename: &str,
        source: &str,
    ) -> Result<IngestReport, RagError> {
        let total_characters = text.chars().count();
        let chunks = chunk_text(text, &self.chunker);
        if chunks.is_empty() {
            return Err(RagError::validation(
                "document produced no usable chunks after extraction",
            ));
        }
        let total_chunks = chunks.len();
        info!(document_id = doc_id, filename, total_chunks, "embedding chunks");

        // Chunks embed one at a time; local embedding backends serve a single
        // request per model instance anyway, and this keeps memory flat.
        let mut records = Vec::with_capacity(total_chunks);
        for (chunk_index, text) in chunks.into_iter().enumerate() {
            let vector = self.model.embed(&text).await?;
            records.push(ChunkRecord {
                id: chunk_point_id(doc_id, chunk_index),
                vector,
                text,
                metadata: ChunkMetadata {
                    document_id: doc_id.to_string(),
                    filename: filename.to_string(),
                    chunk_index,
                    total_chunks,
                    source: source.to_string(),
                },
            });
        }

        // One batch write: either every chunk lands or none do.
        self.index.upsert(records).await?;
        info!(
            document_id = doc_id,
            filename, total_chunks, total_characters, "document indexed"
        );

        Ok(IngestReport {
            document_id: doc_id.to_string(),
            chunk_count: total_chunks,
            total_characters,
        })
    }
}
