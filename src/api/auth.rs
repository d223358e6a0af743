//! Admin authentication
//!
//! A single admin password from the config, kept only as a bcrypt hash in
//! memory, plus helpers for the session cookie.

use axum::http::{header, HeaderMap, HeaderValue};
use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::warn;

use super::session::SESSION_COOKIE;
use crate::error::CmsResult;

/// Password check for the admin area
pub struct AdminAuth {
    password_hash: String,
}

impl AdminAuth {
    /// Hash the configured password with bcrypt's default cost
    pub fn new(password: &str) -> CmsResult<Self> {
        Self::with_cost(password, DEFAULT_COST)
    }

    /// Hash with an explicit cost (tests use the minimum)
    pub fn with_cost(password: &str, cost: u32) -> CmsResult<Self> {
        Ok(Self {
            password_hash: hash(password, cost)?,
        })
    }

    pub fn verify(&self, candidate: &str) -> bool {
        match verify(candidate, &self.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "password verification failed");
                false
            }
        }
    }
}

/// Value of a named cookie from the request's `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
}

/// `Set-Cookie` value establishing the session
pub fn session_cookie(session_id: &str, max_age_secs: u64) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    );
    // Session ids are hex, so the value is always a valid header
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}
