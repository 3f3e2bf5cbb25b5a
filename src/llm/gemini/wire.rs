//! Gemini REST request/response shapes.
//!
//! Responses are decoded into a closed set of part variants; anything the
//! decoder does not recognise lands in [`ResponsePart::Unknown`] and is
//! dropped rather than probed.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::models::{ChatImage, ChatUsage};

const DEFAULT_IMAGE_MIME: &str = "image/png";
const GENERATED_IMAGE_ALT: &str = "Generated image";

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: &'static str,
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Not part of the REST schema, but some gateways flatten the reply here.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Unknown(IgnoredAny),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[serde(default, alias = "uri")]
    pub file_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: Option<u64>,
    #[serde(default)]
    pub candidates_token_count: Option<u64>,
    #[serde(default)]
    pub total_token_count: Option<u64>,
}

impl ResponsePart {
    fn visible_text(&self) -> Option<&str> {
        match self {
            ResponsePart::Text { text, thought: false } => Some(text.as_str()),
            _ => None,
        }
    }

    fn image(&self) -> Option<ChatImage> {
        let url = match self {
            ResponsePart::InlineData { inline_data } => {
                let data = inline_data.data.as_deref().filter(|d| !d.is_empty())?;
                let mime = inline_data.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
                format!("data:{mime};base64,{data}")
            }
            ResponsePart::FileData { file_data } => {
                file_data.file_uri.clone().filter(|u| !u.is_empty())?
            }
            _ => return None,
        };
        Some(ChatImage { url, alt: Some(GENERATED_IMAGE_ALT.to_owned()) })
    }
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// The flattened `text` field when present, otherwise every visible text
    /// part of the first candidate joined together. Falls back to the first
    /// visible text part of any candidate.
    pub fn reply_text(&self) -> String {
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_owned();
        }
        let joined = self.chunk_text();
        if !joined.is_empty() {
            return joined;
        }
        self.parts()
            .find_map(ResponsePart::visible_text)
            .unwrap_or_default()
            .to_owned()
    }

    /// Inline payloads become data URLs; file references pass through.
    pub fn images(&self) -> Vec<ChatImage> {
        self.parts().filter_map(ResponsePart::image).collect()
    }

    /// Text carried by one streamed chunk: every visible text part of the
    /// first candidate, concatenated.
    pub fn chunk_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(ResponsePart::visible_text).collect::<String>())
            .unwrap_or_default()
    }

    pub fn usage(&self) -> Option<ChatUsage> {
        let meta = self.usage_metadata.as_ref()?;
        let usage = ChatUsage {
            prompt_tokens: meta.prompt_token_count,
            completion_tokens: meta.candidates_token_count,
            total_tokens: meta.total_token_count,
        };
        (!usage.is_empty()).then_some(usage)
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

// ── Server-sent events ────────────────────────────────────────────────────────

/// Incremental `text/event-stream` decoder. Bytes may be split anywhere,
/// including inside a UTF-8 sequence; only complete events are emitted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns the `data` payloads of every event that
    /// completed as a result.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            self.handle_line(&line, &mut events);
        }
        events
    }

    /// Flushes a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches('\r');
            let mut events = Vec::new();
            self.handle_line(line, &mut events);
            if let Some(event) = events.pop() {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn handle_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            events.extend(self.dispatch());
        } else if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_owned());
        }
        // Comments, `event:`, `id:` and `retry:` carry nothing we use.
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_serializes_in_rest_shape() {
        let request = GenerateContentRequest {
            contents: vec![Turn { role: "user", parts: vec![TextPart { text: "hi".into() }] }],
            system_instruction: Some(SystemInstruction { parts: vec![TextPart { text: "be kind".into() }] }),
            generation_config: GenerationConfig { temperature: None, max_output_tokens: Some(1) },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "be kind" }] },
                "generationConfig": { "maxOutputTokens": 1 }
            })
        );
    }

    #[test]
    fn empty_generation_config_is_omitted() {
        let request = GenerateContentRequest {
            contents: Vec::new(),
            system_instruction: None,
            generation_config: GenerationConfig::default(),
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({ "contents": [] }));
    }

    #[test]
    fn extracts_text_images_and_usage_from_mixed_parts() {
        let response = decode(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } },
                        { "text": "Here is your cat" },
                        { "functionCall": { "name": "noop" } },
                        { "fileData": { "mimeType": "image/png", "fileUri": "gs://bucket/cat.png" } },
                        { "inlineData": { "data": "BBBB" } },
                        { "text": "second text" }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 3, "totalTokenCount": 42 }
        }));

        assert_eq!(response.reply_text(), "Here is your catsecond text");
        assert_eq!(
            response.images(),
            vec![
                ChatImage { url: "data:image/jpeg;base64,AAAA".into(), alt: Some("Generated image".into()) },
                ChatImage { url: "gs://bucket/cat.png".into(), alt: Some("Generated image".into()) },
                ChatImage { url: "data:image/png;base64,BBBB".into(), alt: Some("Generated image".into()) },
            ]
        );
        assert_eq!(
            response.usage(),
            Some(ChatUsage { prompt_tokens: Some(3), completion_tokens: None, total_tokens: Some(42) })
        );
    }

    #[test]
    fn reply_keeps_text_on_both_sides_of_an_image() {
        let response = decode(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is the picture: " },
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0" } },
                { "text": "a cat on a mat." }
            ] } }]
        }));

        assert_eq!(response.reply_text(), "Here is the picture: a cat on a mat.");
        assert_eq!(response.reply_text(), response.chunk_text());
        assert_eq!(response.images().len(), 1);
    }

    #[test]
    fn reply_falls_back_to_later_candidates() {
        let response = decode(json!({
            "candidates": [
                { "content": { "parts": [{ "inlineData": { "data": "AAAA" } }] } },
                { "content": { "parts": [{ "text": "from the second" }] } }
            ]
        }));
        assert_eq!(response.reply_text(), "from the second");
    }

    #[test]
    fn flattened_text_wins_over_parts() {
        let response = decode(json!({
            "text": "flat",
            "candidates": [{ "content": { "parts": [{ "text": "nested" }] } }]
        }));
        assert_eq!(response.reply_text(), "flat");
    }

    #[test]
    fn tolerates_sparse_and_odd_shapes() {
        let response = decode(json!({
            "candidates": [
                {},
                { "content": {} },
                { "content": { "parts": [{ "inlineData": "not-an-object" }, { "inlineData": {} }] } }
            ]
        }));
        assert_eq!(response.reply_text(), "");
        assert!(response.images().is_empty());
        assert_eq!(response.usage(), None);
    }

    #[test]
    fn chunk_text_joins_visible_parts_of_first_candidate() {
        let chunk = decode(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hel" }, { "text": "hmm", "thought": true }, { "text": "lo" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }));
        assert_eq!(chunk.chunk_text(), "Hello");
    }

    #[test]
    fn sse_events_survive_arbitrary_splits() {
        let stream = "data: {\"a\":1}\r\n\r\n: keep-alive\n\ndata: {\"b\":\"é\"}\n\n";
        let bytes = stream.as_bytes();

        for split in 1..bytes.len() {
            let mut decoder = SseDecoder::default();
            let mut events = decoder.push(&bytes[..split]);
            events.extend(decoder.push(&bytes[split..]));
            events.extend(decoder.finish());
            assert_eq!(events, vec!["{\"a\":1}".to_owned(), "{\"b\":\"é\"}".to_owned()], "split at {split}");
        }
    }

    #[test]
    fn sse_joins_multiline_data_and_flushes_tail() {
        let mut decoder = SseDecoder::default();
        assert_eq!(decoder.push(b"data: line1\ndata: line2\n\n"), vec!["line1\nline2".to_owned()]);
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some("tail".to_owned()));
        assert_eq!(decoder.finish(), None);
    }
}
