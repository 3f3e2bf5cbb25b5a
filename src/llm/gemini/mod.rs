//! Gemini REST client.
//!
//! [`GeminiProvider`] is the injected handle; the underlying [`GeminiClient`]
//! is built on first use so a missing `GEMINI_API_KEY` only fails the calls
//! that need it.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::GeminiSettings;
use crate::errors::AppError;
use crate::models::{ChatMessage, ChatProvider, ChatRequest, ChatResponse, ChatRole};

use super::{FragmentSender, HealthProbe, LlmClient, StreamOutcome};
use wire::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig, SseDecoder,
    SystemInstruction, TextPart, Turn,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CHAT_FAILED: &str = "Gemini API request failed";
const STREAM_FAILED: &str = "Gemini streaming API request failed";

// ── Prompt construction ───────────────────────────────────────────────────────

/// Maps user/assistant messages onto Gemini `user`/`model` turns, oldest
/// first. System messages travel separately as the system instruction.
pub fn build_contents(messages: &[ChatMessage]) -> Vec<Turn> {
    messages
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
                ChatRole::System => return None,
            };
            Some(Turn { role, parts: vec![TextPart { text: m.content.clone() }] })
        })
        .collect()
}

pub fn build_system_instruction(messages: &[ChatMessage]) -> Option<SystemInstruction> {
    let text = messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let text = text.trim();

    (!text.is_empty()).then(|| SystemInstruction {
        parts: vec![TextPart { text: text.to_owned() }],
    })
}

pub fn build_request(request: &ChatRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: build_contents(&request.messages),
        system_instruction: build_system_instruction(&request.messages),
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        },
    }
}

fn health_request() -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Turn { role: "user", parts: vec![TextPart { text: "ping".to_owned() }] }],
        system_instruction: None,
        generation_config: GenerationConfig { temperature: None, max_output_tokens: Some(1) },
    }
}

// ── Provider handle ───────────────────────────────────────────────────────────

pub struct GeminiProvider {
    settings: GeminiSettings,
    client: OnceCell<GeminiClient>,
}

impl GeminiProvider {
    pub fn new(settings: GeminiSettings) -> Self {
        Self { settings, client: OnceCell::new() }
    }

    /// Builds the shared client once; a failed attempt leaves the cell empty.
    async fn client(&self) -> Result<&GeminiClient, AppError> {
        self.client
            .get_or_try_init(|| async { GeminiClient::new(&self.settings) })
            .await
    }
}

#[async_trait]
impl LlmClient for GeminiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        if request.provider != ChatProvider::Gemini {
            return Err(AppError::UnsupportedProvider { provider: request.provider });
        }

        let client = self.client().await?;
        let response = client.generate(&request.model, &build_request(request)).await?;

        Ok(ChatResponse {
            message: ChatMessage::assistant(response.reply_text(), response.images()),
            usage: response.usage(),
        })
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        tx: FragmentSender,
    ) -> Result<StreamOutcome, AppError> {
        if request.provider != ChatProvider::Gemini {
            return Err(AppError::StreamingUnsupported { provider: request.provider });
        }

        let client = self.client().await?;
        client.stream_generate(&request.model, &build_request(request), &tx).await
    }

    async fn check_health(&self) -> HealthProbe {
        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => return HealthProbe::failed(e.to_string()),
        };
        match client.generate(&self.settings.health_model, &health_request()).await {
            Ok(_) => HealthProbe::healthy(),
            Err(e) => HealthProbe::failed(e.to_string()),
        }
    }
}

// ── HTTP client ───────────────────────────────────────────────────────────────

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self, AppError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(AppError::MissingConfig { key: "GEMINI_API_KEY" })?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    pub async fn generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AppError> {
        let response = self.post(self.endpoint(model, "generateContent"), body, CHAT_FAILED).await?;
        let bytes = response.bytes().await.map_err(|e| self.transport_error(CHAT_FAILED, e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::upstream(format!("{CHAT_FAILED}: malformed response: {e}")))
    }

    /// Relays SSE chunks into `tx` until the upstream ends, the upstream
    /// fails, or the receiver is dropped.
    pub async fn stream_generate(
        &self,
        model: &str,
        body: &GenerateContentRequest,
        tx: &FragmentSender,
    ) -> Result<StreamOutcome, AppError> {
        let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));

        let response = tokio::select! {
            _ = tx.closed() => return Ok(StreamOutcome::Cancelled),
            response = self.post(url, body, STREAM_FAILED) => response?,
        };

        let mut chunks = std::pin::pin!(response.bytes_stream());
        let mut decoder = SseDecoder::default();

        loop {
            let next = tokio::select! {
                _ = tx.closed() => return Ok(StreamOutcome::Cancelled),
                next = chunks.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(|e| self.transport_error(STREAM_FAILED, e))?;

            for event in decoder.push(&chunk) {
                if !forward_event(&event, tx).await? {
                    return Ok(StreamOutcome::Cancelled);
                }
            }
        }

        if let Some(event) = decoder.finish() {
            if !forward_event(&event, tx).await? {
                return Ok(StreamOutcome::Cancelled);
            }
        }
        Ok(StreamOutcome::Completed)
    }

    async fn post(
        &self,
        url: String,
        body: &GenerateContentRequest,
        context: &'static str,
    ) -> Result<reqwest::Response, AppError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(context, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<ErrorEnvelope>(&bytes)
                .ok()
                .map(|env| match env.error.status {
                    Some(code) => format!("{code}: {}", env.error.message),
                    None => env.error.message,
                })
                .filter(|m| !m.is_empty()),
            Err(_) => None,
        };
        let detail = detail.unwrap_or_else(|| status.to_string());
        warn!(status = status.as_u16(), "gemini returned an error status");
        Err(AppError::upstream(self.redact(format!("{context}: {detail}"))))
    }

    fn transport_error(&self, context: &str, e: reqwest::Error) -> AppError {
        AppError::upstream(self.redact(format!("{context}: {}", e.without_url())))
    }

    fn redact(&self, message: String) -> String {
        if message.contains(&self.api_key) {
            message.replace(&self.api_key, "[redacted]")
        } else {
            message
        }
    }
}

/// Sends the text of one SSE event downstream. Returns `false` once the
/// receiver is gone.
async fn forward_event(event: &str, tx: &FragmentSender) -> Result<bool, AppError> {
    let value: serde_json::Value = serde_json::from_str(event)
        .map_err(|e| AppError::upstream(format!("{STREAM_FAILED}: malformed event: {e}")))?;

    if value.get("error").is_some() {
        let message = serde_json::from_value::<ErrorEnvelope>(value)
            .map(|env| env.error.message)
            .unwrap_or_else(|_| "unknown error".to_owned());
        return Err(AppError::upstream(format!("{STREAM_FAILED}: {message}")));
    }

    let chunk: GenerateContentResponse = serde_json::from_value(value)
        .map_err(|e| AppError::upstream(format!("{STREAM_FAILED}: malformed event: {e}")))?;
    let text = chunk.chunk_text();
    if text.is_empty() {
        return Ok(true);
    }

    if tx.send(Ok(text)).await.is_err() {
        debug!("stream receiver dropped");
        return Ok(false);
    }
    Ok(true)
}
