//! Ingestion and retrieval core: chunking, PDF extraction, embedding
//! orchestration, and grounded answer generation.

pub mod chunker;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod prompts;
pub mod uploads;

pub use chunker::{ChunkerConfig, chunk_text};
pub use engine::{Answer, AnswerEngine, Confidence, NO_DOCUMENTS_ANSWER, SearchHit, SourceRef};
pub use error::RagError;
pub use extract::ExtractError;
pub use ingest::{IngestReport, IngestionPipeline, document_id};
pub use prompts::HistoryTurn;
pub use uploads::{StoredDocument, UploadStore};
