#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("cannot connect to Ollama at {url}, is it running? {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ollama returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Ollama request timed out; the model may be too large or the prompt too long")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty response from Ollama")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
