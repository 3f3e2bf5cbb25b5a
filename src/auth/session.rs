//! Stateless, HMAC-signed session tokens.
//!
//! Format: `{issued_at_ms}.{base64url(HMAC-SHA256(secret, issued_at_ms))}`.
//! Expiry is the only teardown; there is no server-side session store.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Twelve hours, in milliseconds.
pub const SESSION_MAX_AGE_MS: i64 = 60 * 60 * 12 * 1000;

#[derive(Clone)]
pub struct SessionSigner {
    secret: Option<Arc<str>>,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl SessionSigner {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret: secret.map(Arc::from) }
    }

    pub fn create_session(&self) -> Result<String, AppError> {
        self.create_session_at(Utc::now().timestamp_millis())
    }

    pub fn create_session_at(&self, issued_at_ms: i64) -> Result<String, AppError> {
        let payload = issued_at_ms.to_string();
        let mac = self.mac_for(&payload)?;
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    pub fn is_valid_session(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| self.is_valid_session_at(t, Utc::now().timestamp_millis()))
    }

    /// Re-verifies signature and age; never panics on malformed input.
    pub fn is_valid_session_at(&self, token: &str, now_ms: i64) -> bool {
        let Some((payload, signature)) = token.split_once('.') else {
            return false;
        };
        if signature.contains('.') {
            return false;
        }
        if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let Ok(mac) = self.mac_for(payload) else {
            return false;
        };
        if mac.verify_slice(&signature).is_err() {
            return false;
        }

        let Ok(issued_at) = payload.parse::<i64>() else {
            return false;
        };
        now_ms.saturating_sub(issued_at) <= SESSION_MAX_AGE_MS
    }

    fn mac_for(&self, payload: &str) -> Result<HmacSha256, AppError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(AppError::MissingConfig { key: "SESSION_SECRET or APP_PASSWORD" })?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Unexpected(format!("invalid HMAC key: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}
