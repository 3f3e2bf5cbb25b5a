use std::sync::Arc;

use crate::errors::{AppError, UnsupportedProvider};
use crate::models::ChatProvider;

use super::LlmClient;

/// Closed dispatch table from provider id to client. Providers without a
/// backend resolve to [`UnsupportedProvider`]; there is no fallback.
#[derive(Clone)]
pub struct ProviderRegistry {
    gemini: Arc<dyn LlmClient>,
}

impl ProviderRegistry {
    pub fn new(gemini: Arc<dyn LlmClient>) -> Self {
        Self { gemini }
    }

    pub fn get_client(
        &self,
        provider: ChatProvider,
    ) -> Result<Arc<dyn LlmClient>, UnsupportedProvider> {
        match provider {
            ChatProvider::Gemini => Ok(Arc::clone(&self.gemini)),
            ChatProvider::OpenAi | ChatProvider::Claude => Err(UnsupportedProvider(provider)),
        }
    }

    /// Only Gemini streams; everything else fails before any network I/O.
    pub fn streaming_client(&self, provider: ChatProvider) -> Result<Arc<dyn LlmClient>, AppError> {
        match provider {
            ChatProvider::Gemini => Ok(Arc::clone(&self.gemini)),
            ChatProvider::OpenAi | ChatProvider::Claude => {
                Err(AppError::StreamingUnsupported { provider })
            }
        }
    }

    pub fn is_implemented(provider: ChatProvider) -> bool {
        matches!(provider, ChatProvider::Gemini)
    }
}
