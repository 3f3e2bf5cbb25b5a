pub mod api_routes;
pub mod auth_routes;
pub mod page_routes;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::gate::require_session;
use crate::state::AppState;

/// Assembles the full application router.
///
/// Everything except the login page and the login/logout endpoints sits
/// behind the session gate.
pub fn build(state: AppState) -> Router {
    let protected = Router::new()
        // Pages
        .route("/", get(page_routes::root_handler))
        .route("/chat", get(page_routes::chat_page_handler))
        .route("/settings", get(page_routes::settings_page_handler))
        .route("/settings/{*rest}", get(page_routes::settings_page_handler))
        // LLM API
        .route("/api/llm/chat", post(api_routes::chat_handler))
        .route("/api/llm/chat/stream", post(api_routes::stream_handler))
        .route("/api/llm/health", get(api_routes::health_handler))
        .route("/api/llm/providers", get(api_routes::providers_handler))
        .route_layer(middleware::from_fn_with_state(state.auth.clone(), require_session));

    let public = Router::new()
        .route("/login", get(page_routes::login_page_handler))
        .route("/api/login", post(auth_routes::login_handler))
        .route("/api/logout", post(auth_routes::logout_handler));

    protected
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
