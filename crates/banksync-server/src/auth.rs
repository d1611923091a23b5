//! HTTP basic auth for the upload endpoint.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use banksync::config::BasicAuthCredentials;

use crate::AppState;

pub const CHALLENGE: &str = "Basic realm=\"Secure Area\"";

/// `(username, password)` from an `Authorization: Basic ...` header.
pub fn parse_basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn credentials_match(expected: &BasicAuthCredentials, username: &str, password: &str) -> bool {
    let user_ok = expected.username.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = expected
        .password
        .expose_secret()
        .as_bytes()
        .ct_eq(password.as_bytes());
    (user_ok & pass_ok).into()
}

fn challenge() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(CHALLENGE),
    );
    response
}

pub async fn require_basic_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    match parse_basic_auth(&headers) {
        Some((username, password))
            if credentials_match(&state.basic_auth, &username, &password) =>
        {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!("Rejected basic auth attempt");
            challenge()
        }
        None => challenge(),
    }
}
