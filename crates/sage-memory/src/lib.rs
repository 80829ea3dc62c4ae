//! Vector index for document chunks: Qdrant in production, in-memory for tests.

pub mod error;
pub mod in_memory;
pub mod index;
pub mod qdrant;

pub use error::IndexError;
pub use in_memory::InMemoryIndex;
pub use index::{ChunkMetadata, ChunkRecord, ScoredChunk, VectorIndex};
pub use qdrant::QdrantIndex;
