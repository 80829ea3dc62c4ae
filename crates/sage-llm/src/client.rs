use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::model::{BoxFuture, GenerateOptions, ModelClient};

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TAGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a local Ollama server.
///
/// Embedding calls carry a short timeout; completion calls a much longer one,
/// since generation latency scales with prompt and model size. No automatic
/// retry is performed; callers decide whether a failed call is worth retrying.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    embed_timeout: Duration,
    generate_timeout: Duration,
}

impl OllamaClient {
    /// # Panics
    ///
    /// Panics if the underlying `reqwest` client cannot be constructed
    /// (unreachable in practice).
    #[must_use]
    pub fn new(base_url: &str, chat_model: String, embedding_model: String) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("sage/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default HTTP client construction must not fail");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            chat_model,
            embedding_model,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            generate_timeout: DEFAULT_GENERATE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, embed: Duration, generate: Duration) -> Self {
        self.embed_timeout = embed;
        self.generate_timeout = generate;
        self
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(e)
        } else if e.is_connect() {
            LlmError::Connect {
                url: self.base_url.clone(),
                source: e,
            }
        } else {
            LlmError::Http(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LlmError::Status { status, body })
    }

    /// Generate an embedding vector for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, times out, or the server
    /// responds with a non-success status.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response = self
            .http
            .post(format!("{}/api/embeddings", self.base_url))
            .timeout(self.embed_timeout)
            .json(&EmbeddingsRequest {
                model: &self.embedding_model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: EmbeddingsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(LlmError::Http)?;

        if parsed.embedding.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(parsed.embedding)
    }

    /// Generate a completion for `prompt` without streaming.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Timeout`] when the read deadline passes before the
    /// model finishes, distinct from connection or server-side failures.
    pub async fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> Result<String, LlmError> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&GenerateRequest {
                model: &self.chat_model,
                prompt,
                stream: false,
                options: WireOptions {
                    temperature: options.temperature,
                    num_predict: options.num_predict,
                },
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: GenerateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(LlmError::Http)?;

        if parsed.response.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    /// List models available on the server via `/api/tags`.
    ///
    /// # Errors
    ///
    /// Returns an error if Ollama is unreachable or responds with an error.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(DEFAULT_TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let parsed: TagsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(LlmError::Http)?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Check that Ollama is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.list_models().await?;
        Ok(())
    }
}

impl ModelClient for OllamaClient {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, LlmError>> {
        let text = text.to_owned();
        Box::pin(async move { self.embed(&text).await })
    }

    fn generate(
        &self,
        prompt: &str,
        options: GenerateOptions,
    ) -> BoxFuture<'_, Result<String, LlmError>> {
        let prompt = prompt.to_owned();
        Box::pin(async move { self.generate(&prompt, options).await })
    }

    fn list_models(&self) -> BoxFuture<'_, Result<Vec<String>, LlmError>> {
        Box::pin(OllamaClient::list_models(self))
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: WireOptions,
}

#[derive(Serialize)]
struct WireOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}
