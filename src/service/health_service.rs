use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::llm::ProviderRegistry;
use crate::models::ChatProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub has_api_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implemented: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub providers: BTreeMap<ChatProvider, ProviderHealth>,
}

/// Reports per-provider readiness. Only implemented providers are probed
/// over the network; the rest are described structurally.
#[derive(Clone)]
pub struct HealthService {
    registry: ProviderRegistry,
    api_keys: BTreeMap<ChatProvider, bool>,
}

impl HealthService {
    pub fn new(registry: ProviderRegistry, config: &Config) -> Self {
        let api_keys = ChatProvider::ALL
            .into_iter()
            .map(|p| (p, config.has_api_key(p)))
            .collect();
        Self { registry, api_keys }
    }

    pub async fn check(&self) -> HealthReport {
        let started = Instant::now();
        let mut providers = BTreeMap::new();

        for provider in ChatProvider::ALL {
            let has_api_key = self.api_keys.get(&provider).copied().unwrap_or(false);

            let health = match self.registry.get_client(provider) {
                Ok(client) => {
                    let probe = client.check_health().await;
                    ProviderHealth {
                        has_api_key,
                        ok: Some(probe.ok),
                        error: probe.error,
                        implemented: None,
                    }
                }
                Err(_) => ProviderHealth {
                    has_api_key,
                    ok: None,
                    error: None,
                    implemented: Some(false),
                },
            };

            info!(
                provider = %provider,
                has_api_key = health.has_api_key,
                ok = ?health.ok,
                implemented = ?health.implemented,
                "provider health"
            );
            providers.insert(provider, health);
        }

        info!(duration_ms = started.elapsed().as_millis() as u64, "health check finished");
        HealthReport { providers }
    }
}
