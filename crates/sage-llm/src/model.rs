use std::future::Future;
use std::pin::Pin;

use crate::error::LlmError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sampling parameters for a completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: None,
        }
    }
}

/// Object-safe contract over the model-serving endpoint.
///
/// The retrieval and ingestion components hold this as `Arc<dyn ModelClient>`
/// so tests can substitute a mock without touching the network.
pub trait ModelClient: Send + Sync {
    /// Convert text into a fixed-length vector.
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, LlmError>>;

    /// Generate a completion for an assembled prompt.
    fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> BoxFuture<'_, Result<String, LlmError>>;

    /// List models known to the serving endpoint. Used as a liveness probe.
    fn list_models(&self) -> BoxFuture<'_, Result<Vec<String>, LlmError>>;
}
