//! Test-only mock model client.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::model::{BoxFuture, GenerateOptions, ModelClient};

/// In-process stand-in for [`crate::OllamaClient`].
///
/// Returns a fixed embedding and canned completions, and counts calls so
/// tests can assert which external operations a code path performed.
#[derive(Debug, Clone)]
pub struct MockModel {
    pub embedding: Vec<f32>,
    pub response: String,
    pub fail_embed: bool,
    pub fail_generate: bool,
    pub fail_list: bool,
    embed_calls: Arc<AtomicUsize>,
    generate_calls: Arc<AtomicUsize>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self {
            embedding: vec![1.0, 0.0, 0.0, 0.0],
            response: "mock answer".into(),
            fail_embed: false,
            fail_generate: false,
            fail_list: false,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            generate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockModel {
    #[must_use]
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_embed() -> Self {
        Self {
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_generate() -> Self {
        Self {
            fail_generate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

impl ModelClient for MockModel {
    fn embed(&self, _text: &str) -> BoxFuture<'_, Result<Vec<f32>, LlmError>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_embed {
            Err(LlmError::Other("mock embed error".into()))
        } else {
            Ok(self.embedding.clone())
        };
        Box::pin(async move { result })
    }

    fn generate(
        &self,
        _prompt: &str,
        _options: GenerateOptions,
    ) -> BoxFuture<'_, Result<String, LlmError>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail_generate {
            Err(LlmError::Other("mock generate error".into()))
        } else {
            Ok(self.response.clone())
        };
        Box::pin(async move { result })
    }

    fn list_models(&self) -> BoxFuture<'_, Result<Vec<String>, LlmError>> {
        let result = if self.fail_list {
            Err(LlmError::Other("mock list error".into()))
        } else {
            Ok(vec!["mock".to_owned()])
        };
        Box::pin(async move { result })
    }
}
