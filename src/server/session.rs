//! Signed cookie sessions.
//!
//! The whole session is a small JSON document stored client-side as
//! `base64url(json).hex(hmac_sha256(json))`. A cookie that fails the MAC
//! check or does not parse is treated as an empty session.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "towerdocs_session";

/// Lifetime of an admin session cookie in seconds. Anonymous sessions end with the browser.
const ADMIN_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Failed-login limit per window.
pub const LOGIN_ATTEMPT_LIMIT: usize = 5;
pub const LOGIN_WINDOW_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Per-browser state carried in the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub visit_counted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    /// Unix timestamps of recent login attempts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub login_attempts: Vec<i64>,
}

impl Session {
    /// Load the session from request headers; missing or invalid cookies give an empty session.
    pub fn from_headers(headers: &HeaderMap, key: &SessionKey) -> Self {
        cookie_value(headers, COOKIE_NAME)
            .and_then(|value| key.decode(value))
            .unwrap_or_default()
    }

    /// CSRF token for forms, created on first use.
    pub fn csrf_token(&mut self) -> String {
        self.csrf_token
            .get_or_insert_with(|| uuid::Uuid::new_v4().simple().to_string())
            .clone()
    }

    /// Compare a submitted token with the session token.
    pub fn verify_csrf(&self, submitted: &str) -> bool {
        match self.csrf_token.as_deref() {
            Some(expected) if !submitted.is_empty() => {
                expected.len() == submitted.len()
                    && expected
                        .bytes()
                        .zip(submitted.bytes())
                        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                        == 0
            }
            _ => false,
        }
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Remove and return pending flash messages.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Record a login attempt at `now`; false if the window's limit is already used up.
    pub fn allow_login_attempt(&mut self, now: i64) -> bool {
        self.login_attempts
            .retain(|t| now - *t < LOGIN_WINDOW_SECS && *t <= now);
        if self.login_attempts.len() >= LOGIN_ATTEMPT_LIMIT {
            return false;
        }
        self.login_attempts.push(now);
        true
    }

    /// Mark the session as logged in. The CSRF token is rotated.
    pub fn log_in(&mut self) {
        self.admin = true;
        self.login_attempts.clear();
        self.csrf_token = None;
    }

    pub fn log_out(&mut self) {
        self.admin = false;
        self.csrf_token = None;
    }

    /// `Set-Cookie` header value for this session.
    pub fn cookie(&self, key: &SessionKey) -> Option<HeaderValue> {
        let mut value = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            COOKIE_NAME,
            key.encode(self)
        );
        if self.admin {
            value.push_str(&format!("; Max-Age={}", ADMIN_MAX_AGE_SECS));
        }
        HeaderValue::from_str(&value).ok()
    }

    /// Attach this session to a response.
    pub fn save(&self, key: &SessionKey, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        match self.cookie(key) {
            Some(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            None => tracing::warn!("Session cookie could not be encoded"),
        }
        response
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Session::from_headers(&parts.headers, &state.session_key))
    }
}

/// HMAC key for signing session cookies.
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }

    pub fn encode(&self, session: &Session) -> String {
        let payload = serde_json::to_vec(session).unwrap_or_else(|_| b"{}".to_vec());
        let mut mac = self.mac();
        mac.update(&payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            hex::encode(mac.finalize().into_bytes())
        )
    }

    pub fn decode(&self, value: &str) -> Option<Session> {
        let (payload_b64, signature_hex) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = hex::decode(signature_hex).ok()?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;

        serde_json::from_slice(&payload).ok()
    }
}

/// Find a cookie by name in the `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Only root-relative paths are accepted as post-login redirects.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|n| {
        n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\") && !n.contains("://")
    })
}

/// Middleware for admin routes: redirect to the login page without an admin session.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut session = Session::from_headers(request.headers(), &state.session_key);
    if session.admin {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/admin/".to_string());
    session.flash(FlashLevel::Error, "You must be logged in to access this page.");
    let location = format!("/admin/login?next={}", urlencoding::encode(&target));
    session.save(&state.session_key, Redirect::to(&location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_round_trip() {
        let key = SessionKey::new("test-secret");
        let mut session = Session::default();
        session.admin = true;
        session.flash(FlashLevel::Success, "Saved");
        let token = session.csrf_token();

        let decoded = key.decode(&key.encode(&session)).unwrap();
        assert_eq!(decoded, session);
        assert!(decoded.verify_csrf(&token));
        assert!(!decoded.verify_csrf("nope"));
        assert!(!decoded.verify_csrf(""));
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let key = SessionKey::new("test-secret");
        let encoded = key.encode(&Session::default());
        let (_, sig) = encoded.split_once('.').unwrap();

        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"admin":true}"#);
        assert!(key.decode(&format!("{}.{}", forged_payload, sig)).is_none());
        assert!(SessionKey::new("other").decode(&encoded).is_none());
        assert!(key.decode("garbage").is_none());
    }

    #[test]
    fn test_session_from_headers() {
        let key = SessionKey::new("k");
        let session = Session {
            admin: true,
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", COOKIE_NAME, key.encode(&session)))
                .unwrap(),
        );
        assert!(Session::from_headers(&headers, &key).admin);

        headers.insert(header::COOKIE, HeaderValue::from_static("towerdocs_session=abc.def"));
        assert_eq!(Session::from_headers(&headers, &key), Session::default());
    }

    #[test]
    fn test_only_admin_cookie_persists() {
        let key = SessionKey::new("k");
        let visitor = Session {
            visit_counted: true,
            ..Default::default()
        };
        let cookie = visitor.cookie(&key).unwrap();
        assert!(!cookie.to_str().unwrap().contains("Max-Age"));

        let admin = Session {
            admin: true,
            ..Default::default()
        };
        let cookie = admin.cookie(&key).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Max-Age=604800"));
    }

    #[test]
    fn test_login_rate_limit_window() {
        let mut session = Session::default();
        for i in 0..LOGIN_ATTEMPT_LIMIT as i64 {
            assert!(session.allow_login_attempt(1_000 + i));
        }
        assert!(!session.allow_login_attempt(1_010));
        assert!(session.allow_login_attempt(1_000 + LOGIN_WINDOW_SECS + 1));
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/admin/categories")), Some("/admin/categories"));
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
