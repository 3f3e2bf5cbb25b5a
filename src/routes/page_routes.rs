use axum::response::{Html, IntoResponse, Redirect};

// ── Static shells ─────────────────────────────────────────────────────────────

const LOGIN_HTML: &str = include_str!("../../assets/login.html");
const CHAT_HTML: &str = include_str!("../../assets/chat.html");
const SETTINGS_HTML: &str = include_str!("../../assets/settings.html");

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET `/` — the chat page is the home screen.
pub async fn root_handler() -> impl IntoResponse {
    Redirect::temporary("/chat")
}

/// GET `/chat`
pub async fn chat_page_handler() -> impl IntoResponse {
    Html(CHAT_HTML)
}

/// GET `/settings` and everything below it
pub async fn settings_page_handler() -> impl IntoResponse {
    Html(SETTINGS_HTML)
}

/// GET `/login` — reachable without a session.
pub async fn login_page_handler() -> impl IntoResponse {
    Html(LOGIN_HTML)
}
