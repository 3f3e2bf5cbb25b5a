//! Structural checks for inbound chat payloads.
//!
//! The predicate works on raw JSON so malformed shapes are rejected with a
//! boolean instead of a deserializer error message.

use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{ChatProvider, ChatRequest, ChatRole};

pub fn is_chat_message(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let role_ok = obj
        .get("role")
        .and_then(Value::as_str)
        .is_some_and(|r| r.parse::<ChatRole>().is_ok());

    role_ok && obj.get("content").is_some_and(Value::is_string)
}

pub fn is_chat_request(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let provider_ok = obj
        .get("provider")
        .and_then(Value::as_str)
        .is_some_and(|p| p.parse::<ChatProvider>().is_ok());
    if !provider_ok {
        return false;
    }

    if !obj.get("model").and_then(Value::as_str).is_some_and(|m| !m.is_empty()) {
        return false;
    }

    match obj.get("messages").and_then(Value::as_array) {
        Some(messages) if messages.iter().all(is_chat_message) => {}
        _ => return false,
    }

    optional_number(obj, "temperature") && optional_number(obj, "maxTokens")
}

fn optional_number(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).is_none_or(Value::is_number)
}

/// Parses a request body into a [`ChatRequest`], distinguishing unparsable
/// JSON from a well-formed document of the wrong shape.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, AppError> {
    let json: Value = serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)?;

    if !is_chat_request(&json) {
        return Err(AppError::InvalidPayload);
    }

    serde_json::from_value(json).map_err(|_| AppError::InvalidPayload)
}
