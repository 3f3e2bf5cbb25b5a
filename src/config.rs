//! Process configuration, read once from the environment at startup.
//!
//! Nothing here fails: secrets and API keys are optional so that unrelated
//! routes keep serving, and each dependent operation reports its own missing
//! key when it first runs.

use crate::llm::catalog;
use crate::models::ChatProvider;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared password checked at login.
    pub app_password: Option<String>,
    /// HMAC key for session tokens; falls back to `app_password`.
    pub session_secret: Option<String>,
    pub gemini: GeminiSettings,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used by the one-token liveness probe.
    pub health_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Blank values
    /// count as unset.
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let app_password = non_empty(&lookup, "APP_PASSWORD");
        let session_secret = non_empty(&lookup, "SESSION_SECRET").or_else(|| app_password.clone());

        Self {
            app_password,
            session_secret,
            gemini: GeminiSettings {
                api_key: non_empty(&lookup, "GEMINI_API_KEY"),
                base_url: value_or(&lookup, "GEMINI_API_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                health_model: value_or(
                    &lookup,
                    "GEMINI_HEALTH_MODEL",
                    catalog::default_model(ChatProvider::Gemini),
                ),
            },
            openai_api_key: non_empty(&lookup, "OPENAI_API_KEY"),
            anthropic_api_key: non_empty(&lookup, "ANTHROPIC_API_KEY"),
            secure_cookies: non_empty(&lookup, "APP_ENV")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("production")),
            port: parsed_or(&lookup, "PORT", 8080),
        }
    }

    pub fn has_api_key(&self, provider: ChatProvider) -> bool {
        match provider {
            ChatProvider::Gemini => self.gemini.api_key.is_some(),
            ChatProvider::OpenAi => self.openai_api_key.is_some(),
            ChatProvider::Claude => self.anthropic_api_key.is_some(),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn non_empty<L: Fn(&str) -> Option<String>>(lookup: &L, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn value_or<L: Fn(&str) -> Option<String>>(lookup: &L, key: &str, default: &str) -> String {
    non_empty(lookup, key).unwrap_or_else(|| default.to_owned())
}

fn parsed_or<L, T>(lookup: &L, key: &str, default: T) -> T
where
    L: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    non_empty(lookup, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    /// Fully populated configuration for tests; no environment access.
    pub fn for_tests() -> Self {
        Self {
            app_password: Some("hunter2".to_owned()),
            session_secret: Some("hunter2".to_owned()),
            gemini: GeminiSettings {
                api_key: Some("test-gemini-key".to_owned()),
                base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
                health_model: catalog::default_model(ChatProvider::Gemini).to_owned(),
            },
            openai_api_key: None,
            anthropic_api_key: Some("test-anthropic-key".to_owned()),
            secure_cookies: false,
            port: 0,
        }
    }
}
