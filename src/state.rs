use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::llm::gemini::GeminiProvider;
use crate::llm::ProviderRegistry;
use crate::service::chat_service::ChatService;
use crate::service::health_service::HealthService;

/// Everything a handler may need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub auth: Authenticator,
    pub chat: ChatService,
    pub health: HealthService,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let gemini = GeminiProvider::new(config.gemini.clone());
        Self::with_registry(config, ProviderRegistry::new(Arc::new(gemini)))
    }

    pub fn with_registry(config: &Config, registry: ProviderRegistry) -> Self {
        Self {
            auth: Authenticator::from_config(config),
            chat: ChatService::new(registry.clone()),
            health: HealthService::new(registry, config),
        }
    }
}
