use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::llm::{ProviderRegistry, StreamOutcome};
use crate::models::{ChatRequest, ChatResponse};

/// Fragments buffered between the upstream reader and the HTTP body.
const STREAM_BUFFER: usize = 64;

pub type FragmentStream = ReceiverStream<Result<String, AppError>>;

/// Orchestrates one chat turn: provider dispatch, the model call, and
/// request logging. Logs carry provider, model and timing only.
#[derive(Clone)]
pub struct ChatService {
    registry: ProviderRegistry,
}

impl ChatService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        let started = Instant::now();

        let client = match self.registry.get_client(request.provider) {
            Ok(client) => client,
            Err(unsupported) => {
                warn!(
                    provider = %unsupported.0,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "unsupported provider"
                );
                return Err(unsupported.into());
            }
        };

        match client.chat(&request).await {
            Ok(response) => {
                info!(
                    provider = %request.provider,
                    model = %request.model,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "llm chat succeeded"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    provider = %request.provider,
                    model = %request.model,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "llm chat failed"
                );
                Err(e)
            }
        }
    }

    /// Starts a producer task reading from the upstream and returns the
    /// consuming end. Fails before any I/O when the provider cannot stream.
    pub fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, AppError> {
        let client = self.registry.streaming_client(request.provider)?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            let started = Instant::now();
            let result = client.stream_chat(&request, tx.clone()).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(StreamOutcome::Completed) => info!(
                    provider = %request.provider,
                    model = %request.model,
                    duration_ms,
                    "llm stream completed"
                ),
                Ok(StreamOutcome::Cancelled) => info!(
                    provider = %request.provider,
                    model = %request.model,
                    duration_ms,
                    "llm stream cancelled by client"
                ),
                Err(e) => {
                    error!(
                        provider = %request.provider,
                        model = %request.model,
                        duration_ms,
                        error = %e,
                        "llm stream failed"
                    );
                    // Surfaces as an aborted body rather than a clean end.
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use crate::llm::{FragmentSender, HealthProbe, LlmClient};
    use crate::models::{ChatMessage, ChatProvider, ChatRole};

    struct Scripted {
        fragments: Vec<&'static str>,
        fail_after: bool,
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn chat(&self, _: &ChatRequest) -> Result<ChatResponse, AppError> {
            Err(AppError::upstream("Gemini API request failed: boom"))
        }

        async fn stream_chat(&self, _: &ChatRequest, tx: FragmentSender) -> Result<StreamOutcome, AppError> {
            for fragment in &self.fragments {
                if tx.send(Ok((*fragment).to_owned())).await.is_err() {
                    return Ok(StreamOutcome::Cancelled);
                }
            }
            if self.fail_after {
                return Err(AppError::upstream("connection reset"));
            }
            Ok(StreamOutcome::Completed)
        }

        async fn check_health(&self) -> HealthProbe {
            HealthProbe::healthy()
        }
    }

    fn service(fragments: Vec<&'static str>, fail_after: bool) -> ChatService {
        ChatService::new(ProviderRegistry::new(Arc::new(Scripted { fragments, fail_after })))
    }

    fn request(provider: ChatProvider) -> ChatRequest {
        ChatRequest {
            provider,
            model: "m".to_owned(),
            messages: vec![ChatMessage::new(ChatRole::User, "hi")],
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn chat_propagates_upstream_failure() {
        let err = service(vec![], false).chat(request(ChatProvider::Gemini)).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn chat_rejects_unimplemented_provider() {
        let err = service(vec![], false).chat(request(ChatProvider::OpenAi)).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedProvider { provider: ChatProvider::OpenAi }));
    }

    #[tokio::test]
    async fn stream_yields_fragments_then_closes() {
        let stream = service(vec!["a", "b"], false).stream_chat(request(ChatProvider::Gemini)).unwrap();
        let items: Vec<_> = stream.collect().await;
        let texts: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stream_failure_arrives_as_final_error() {
        let stream = service(vec!["a"], true).stream_chat(request(ChatProvider::Gemini)).unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(AppError::Upstream { .. })));
    }

    #[tokio::test]
    async fn stream_refuses_non_streaming_provider() {
        let err = service(vec![], false).stream_chat(request(ChatProvider::Claude)).unwrap_err();
        assert!(matches!(err, AppError::StreamingUnsupported { provider: ChatProvider::Claude }));
    }
}
