use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use sage_llm::LlmError;
use sage_rag::RagError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// An error as it leaves the API: an HTTP status, a stable machine-readable
/// category, and a human-readable message.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    category: &'static str,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            category: "validation",
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            category: "not_found",
            message: message.into(),
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match &err {
            RagError::Validation(msg) => Self::bad_request(msg.clone()),
            RagError::NotFound(id) => Self::not_found(format!("document not found: {id}")),
            RagError::Extract(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                category: "extraction",
                message: err.to_string(),
            },
            RagError::Llm(LlmError::Timeout(_)) => Self {
                status: StatusCode::GATEWAY_TIMEOUT,
                category: "llm_timeout",
                message: err.to_string(),
            },
            RagError::Llm(LlmError::Connect { .. }) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                category: "llm_unavailable",
                message: err.to_string(),
            },
            RagError::Llm(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                category: "llm",
                message: err.to_string(),
            },
            RagError::Index(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                category: "index",
                message: err.to_string(),
            },
            RagError::Io(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                category: "io",
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(category = self.category, "{}", self.message);
        }
        let body = serde_json::json!({
            "error": self.category,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}
