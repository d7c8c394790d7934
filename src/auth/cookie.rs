//! Session cookie construction and extraction.
//!
//! The session token travels in an http-only `auth-token` cookie with a
//! `lax` same-site policy, marked `Secure` in production. API clients may
//! alternatively present the token as an `Authorization: Bearer` header.

use axum::http::{header, HeaderMap};

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth-token";

/// Build the `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Extract the session token from a request: the `auth-token` cookie, or a
/// bearer token as fallback.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, AUTH_COOKIE) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
