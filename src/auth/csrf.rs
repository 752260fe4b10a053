//! Double-submit CSRF protection for cookie-authenticated requests.
//!
//! The token lives only in the client's `csrf_token` cookie and is echoed back
//! in the `X-CSRF-Token` header; the server keeps no copy.

use axum::http::{HeaderMap, Method};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use subtle::ConstantTimeEq;

pub const COOKIE_NAME: &str = "csrf_token";
pub const HEADER_NAME: &str = "x-csrf-token";
const TOKEN_HOURS: i64 = 2;

pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token.to_string()))
        .path("/")
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(TOKEN_HOURS))
        .build()
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Checks that the header token matches the cookie token.
pub fn verify(headers: &HeaderMap, jar: &CookieJar) -> Result<(), &'static str> {
    let cookie = jar
        .get(COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or("Missing CSRF cookie")?;
    let header = headers
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing CSRF header")?;

    if cookie.is_empty() || !bool::from(cookie.as_bytes().ct_eq(header.as_bytes())) {
        return Err("CSRF token mismatch");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(COOKIE_NAME, token.to_string()))
    }

    #[test]
    fn matching_header_passes() {
        let token = generate_token();
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_NAME, HeaderValue::from_str(&token).unwrap());
        assert!(verify(&headers, &jar_with(&token)).is_ok());
    }

    #[test]
    fn mismatch_or_missing_fails() {
        let mut headers = HeaderMap::new();
        assert!(verify(&headers, &jar_with("abc")).is_err());
        headers.insert(HEADER_NAME, HeaderValue::from_static("abd"));
        assert!(verify(&headers, &jar_with("abc")).is_err());
        assert!(verify(&headers, &CookieJar::new()).is_err());
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
