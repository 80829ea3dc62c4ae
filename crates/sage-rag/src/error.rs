use crate::extract::ExtractError;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("language model error: {0}")]
    Llm(#[from] sage_llm::LlmError),

    #[error("vector index error: {0}")]
    Index(#[from] sage_memory::IndexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document not found: {0}")]
    NotFound(String),
}

impl RagError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
