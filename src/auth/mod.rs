//! Shared-password login and session cookies.

pub mod gate;
pub mod session;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::Config;
pub use session::{SessionSigner, SESSION_MAX_AGE_MS};

pub const SESSION_COOKIE: &str = "app_auth";

#[derive(Clone)]
pub struct Authenticator {
    login_secret: Option<Arc<str>>,
    sessions: SessionSigner,
    secure_cookies: bool,
}

impl Authenticator {
    pub fn new(
        login_secret: Option<String>,
        sessions: SessionSigner,
        secure_cookies: bool,
    ) -> Self {
        Self { login_secret: login_secret.map(Arc::from), sessions, secure_cookies }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.app_password.clone(),
            SessionSigner::new(config.session_secret.clone()),
            config.secure_cookies,
        )
    }

    pub fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    pub fn is_login_configured(&self) -> bool {
        self.login_secret.is_some()
    }

    /// Compares SHA-256 digests in constant time so neither the content nor
    /// the length of the shared password leaks through timing.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let Some(secret) = self.login_secret.as_deref() else {
            return false;
        };
        if candidate.is_empty() {
            return false;
        }
        let expected = Sha256::digest(secret.as_bytes());
        let provided = Sha256::digest(candidate.as_bytes());
        expected.as_slice().ct_eq(provided.as_slice()).into()
    }

    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_MAX_AGE_MS / 1000
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn cleared_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
