use serde::{Deserialize, Deserializer, Serialize};

/// Upstream LLM vendor family a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    OpenAi,
    Gemini,
    Claude,
}

impl ChatProvider {
    pub const ALL: [ChatProvider; 3] =
        [ChatProvider::OpenAi, ChatProvider::Gemini, ChatProvider::Claude];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatProvider::OpenAi => "openai",
            ChatProvider::Gemini => "gemini",
            ChatProvider::Claude => "claude",
        }
    }
}

impl std::fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChatProvider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ChatProvider::OpenAi),
            "gemini" => Ok(ChatProvider::Gemini),
            "claude" => Ok(ChatProvider::Claude),
            other => Err(format!("Unknown provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::str::FromStr for ChatRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(ChatRole::System),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// An image produced by a multimodal model. `url` is either a data URL or a
/// remote URI and can be handed to an `<img src>` as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Only ever filled on replies; inbound history never carries images upstream.
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ChatImage>,
}

impl ChatMessage {
    #[cfg(test)]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), images: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>, images: Vec<ChatImage>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), images }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub provider: ChatProvider,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(
        default,
        deserialize_with = "token_limit",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_tokens: Option<u32>,
}

/// Any JSON number is accepted as a token limit; fractions truncate and
/// large values saturate. Anything below one token means no limit.
fn token_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.filter(|v| *v >= 1.0).map(|v| v as u32))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl ChatUsage {
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_lowercase_enums() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "provider": "openai",
            "model": "gpt-5-mini",
            "messages": [{ "role": "system", "content": "be brief" }],
            "maxTokens": 256.9
        }))
        .unwrap();

        assert_eq!(request.provider, ChatProvider::OpenAi);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn token_limits_below_one_are_dropped() {
        let limit = |max_tokens: serde_json::Value| {
            let request: ChatRequest = serde_json::from_value(serde_json::json!({
                "provider": "gemini",
                "model": "m",
                "messages": [],
                "maxTokens": max_tokens
            }))
            .unwrap();
            request.max_tokens
        };

        assert_eq!(limit(serde_json::json!(-5)), None);
        assert_eq!(limit(serde_json::json!(0)), None);
        assert_eq!(limit(serde_json::json!(0.9)), None);
        assert_eq!(limit(serde_json::json!(1)), Some(1));
        assert_eq!(limit(serde_json::json!(1e12)), Some(u32::MAX));
    }

    #[test]
    fn inbound_images_are_ignored() {
        let message: ChatMessage = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "content": "here",
            "images": [{ "url": "data:image/png;base64,AAAA" }]
        }))
        .unwrap();
        assert!(message.images.is_empty());
    }

    #[test]
    fn response_omits_empty_images_and_usage() {
        let response = ChatResponse { message: ChatMessage::assistant("hi", Vec::new()), usage: None };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "message": { "role": "assistant", "content": "hi" } }));
    }

    #[test]
    fn provider_round_trips_through_str() {
        for provider in ChatProvider::ALL {
            assert_eq!(provider.as_str().parse::<ChatProvider>().unwrap(), provider);
        }
        assert!("mistral".parse::<ChatProvider>().is_err());
    }
}
