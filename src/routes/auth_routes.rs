use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};

use crate::models::LoginRequest;
use crate::state::AppState;

/// POST `/api/login` — exchanges the shared password for a session cookie.
pub async fn login_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let auth = &state.auth;
    let password = serde_json::from_slice::<LoginRequest>(&body)
        .unwrap_or_default()
        .password
        .unwrap_or_default();

    if !auth.is_login_configured() {
        error!("APP_PASSWORD is not set; logins are disabled");
    }
    if !auth.verify_password(&password) {
        warn!("login rejected");
        return invalid_credentials();
    }

    match auth.sessions().create_session() {
        Ok(token) => {
            info!("login succeeded");
            (
                [(header::SET_COOKIE, auth.session_cookie(&token))],
                Json(json!({ "ok": true })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to create session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "message": "Login is not available" })),
            )
                .into_response()
        }
    }
}

/// POST `/api/logout` — drops the browser's copy of the session cookie.
pub async fn logout_handler(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.auth.cleared_cookie())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "ok": false, "message": "Invalid credentials" })),
    )
        .into_response()
}
