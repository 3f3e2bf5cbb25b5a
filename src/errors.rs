use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::ChatProvider;

/// Top-level application error.
///
/// Client-facing variants render their own message; upstream and
/// configuration failures are logged in full and surfaced with a generic body.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Request validation ───────────────────────────────────────────────────
    #[error("Invalid JSON body")]
    InvalidJson,

    #[error("Invalid chat request payload")]
    InvalidPayload,

    // ── Provider dispatch ────────────────────────────────────────────────────
    #[error("Provider \"{provider}\" is not implemented yet")]
    UnsupportedProvider { provider: ChatProvider },

    #[error("Streaming is not supported for provider \"{provider}\"")]
    StreamingUnsupported { provider: ChatProvider },

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("{key} is not set. Please configure it in your environment.")]
    MissingConfig { key: &'static str },

    // ── Upstream model API ───────────────────────────────────────────────────
    #[error("{message}")]
    Upstream { message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Returned by the provider registry when no client backs the requested id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Provider \"{0}\" is not implemented yet")]
pub struct UnsupportedProvider(pub ChatProvider);

impl From<UnsupportedProvider> for AppError {
    fn from(e: UnsupportedProvider) -> Self {
        AppError::UnsupportedProvider { provider: e.0 }
    }
}

impl AppError {
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidJson | AppError::InvalidPayload => StatusCode::BAD_REQUEST,
            AppError::UnsupportedProvider { .. } | AppError::StreamingUnsupported { .. } => {
                StatusCode::NOT_IMPLEMENTED
            }
            AppError::MissingConfig { .. }
            | AppError::Upstream { .. }
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::InvalidJson | AppError::InvalidPayload => {
                json!({ "error": self.to_string() })
            }
            AppError::UnsupportedProvider { provider } => json!({
                "error": "Selected provider is not supported yet.",
                "provider": provider,
            }),
            AppError::StreamingUnsupported { provider } => json!({
                "error": format!(
                    "Streaming is currently supported only for provider '{}'.",
                    ChatProvider::Gemini
                ),
                "provider": provider,
            }),
            // Detail stays in the server log.
            AppError::MissingConfig { .. } | AppError::Upstream { .. } => {
                error!(error = %self, "llm request failed");
                json!({ "error": "LLM chat request failed." })
            }
            AppError::Unexpected(message) => {
                error!(message = %message, "internal server error");
                json!({ "error": "internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
