mod auth;
mod config;
mod errors;
mod llm;
mod models;
mod routes;
mod service;
mod state;
mod validation;

use tracing::{info, warn};

use crate::config::Config;
use crate::models::ChatProvider;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_gateway=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = Config::from_env();

    if config.app_password.is_none() {
        warn!("APP_PASSWORD is not set; every login attempt will be rejected");
    }
    if !config.has_api_key(ChatProvider::Gemini) {
        warn!("GEMINI_API_KEY is not set; Gemini requests will fail until it is configured");
    }

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let state = AppState::from_config(&config);
    let app = routes::build(state);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
