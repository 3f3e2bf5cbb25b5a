use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::llm::catalog;
use crate::models::ChatResponse;
use crate::service::health_service::HealthReport;
use crate::state::AppState;
use crate::validation::parse_chat_request;

/// POST `/api/llm/chat` — one buffered completion.
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError> {
    let request = parse_chat_request(&body)?;
    let response = state.chat.chat(request).await?;
    Ok(Json(response))
}

/// POST `/api/llm/chat/stream` — raw text fragments as they arrive.
///
/// An upstream failure after the headers went out aborts the chunked body
/// instead of ending it cleanly.
pub async fn stream_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = parse_chat_request(&body)?;
    let fragments = state.chat.stream_chat(request)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
        ],
        Body::from_stream(fragments),
    )
        .into_response())
}

/// GET `/api/llm/health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.check().await)
}

/// GET `/api/llm/providers` — selectable providers and models.
pub async fn providers_handler() -> Json<Value> {
    Json(json!({
        "defaultProvider": catalog::DEFAULT_PROVIDER,
        "providers": catalog::PROVIDERS,
    }))
}
