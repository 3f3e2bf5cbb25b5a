//! Provider-facing side of the chat pipeline.

pub mod catalog;
pub mod gemini;
pub mod registry;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse};

pub use registry::ProviderRegistry;

/// Receives text fragments as the upstream produces them. Errors travel on
/// the same channel so the consumer can abort instead of truncating.
pub type FragmentSender = mpsc::Sender<Result<String, AppError>>;

/// How a streaming call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    /// The consumer went away; the upstream response was dropped early.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthProbe {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthProbe {
    pub fn healthy() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { ok: false, error: Some(error.into()) }
    }
}

/// A chat-completion backend for one provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;

    /// Pushes non-empty text fragments into `tx` until the upstream finishes.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        tx: FragmentSender,
    ) -> Result<StreamOutcome, AppError>;

    /// Minimal generation call used as a liveness probe.
    async fn check_health(&self) -> HealthProbe;
}
