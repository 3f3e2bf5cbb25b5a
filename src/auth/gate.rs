use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::debug;

use super::{Authenticator, SESSION_COOKIE};

pub const LOGIN_PATH: &str = "/login";

/// Lets the request through only when it carries a session cookie that
/// verifies right now; otherwise redirects to the login page with the
/// original path in `from`.
pub async fn require_session(
    State(auth): State<Authenticator>,
    req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    if auth.sessions().is_valid_session(token.as_deref()) {
        return next.run(req).await;
    }

    let path = req.uri().path();
    debug!(path = %path, has_cookie = token.is_some(), "session rejected, redirecting to login");
    login_redirect(path)
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_owned())
}

fn login_redirect(from: &str) -> Response {
    let location = format!("{LOGIN_PATH}?from={}", encode_query_value(from));
    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            let fallback = HeaderValue::from_static(LOGIN_PATH);
            (StatusCode::FOUND, [(header::LOCATION, fallback)]).into_response()
        }
    }
}

/// Paths arrive already percent-encoded; only the characters that would
/// break out of a query value need escaping. `/` and `%` stay literal.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}
