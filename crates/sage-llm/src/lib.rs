//! Ollama REST client: embeddings, non-streaming completions, model listing.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;

pub use client::OllamaClient;
pub use error::LlmError;
pub use model::{GenerateOptions, ModelClient};
