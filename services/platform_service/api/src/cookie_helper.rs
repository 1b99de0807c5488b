//! Cookie construction and parsing for the auth surface
//!
//! Three cookies exist: `access_token` (HttpOnly fallback for clients that
//! cannot hold the bearer token), `__csrf_token` (JS-readable, double-submit
//! pair of the `X-CSRF-Token` header), and `oauth_state` (HttpOnly, five
//! minutes, round-trips the federation state value).

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const CSRF_COOKIE: &str = "__csrf_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Shape of one cookie we set
pub struct CookieSpec<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub max_age: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: &'a str,
}

/// Build a Set-Cookie header value
pub fn build_cookie(spec: &CookieSpec<'_>) -> Result<HeaderValue, String> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite={}",
        spec.name, spec.value, spec.max_age, spec.same_site
    );
    if spec.http_only {
        cookie.push_str("; HttpOnly");
    }
    if spec.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| format!("invalid cookie value: {}", e))
}

/// Append the HttpOnly access-token cookie
pub fn append_access_cookie(
    headers: &mut HeaderMap,
    token: &str,
    max_age: i64,
    secure: bool,
) {
    if let Ok(value) = build_cookie(&CookieSpec {
        name: ACCESS_TOKEN_COOKIE,
        value: token,
        max_age,
        http_only: true,
        secure,
        same_site: "Lax",
    }) {
        headers.append(SET_COOKIE, value);
    }
}

/// Append a clearing Set-Cookie (Max-Age=0)
pub fn append_clear_cookie(headers: &mut HeaderMap, name: &str, secure: bool) {
    if let Ok(value) = build_cookie(&CookieSpec {
        name,
        value: "",
        max_age: 0,
        http_only: true,
        secure,
        same_site: "Lax",
    }) {
        headers.append(SET_COOKIE, value);
    }
}

/// Extract a cookie value from the Cookie header
pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(axum::http::header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?;
                let value = parts.next()?;
                if name == cookie_name {
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_shape() {
        let mut headers = HeaderMap::new();
        append_access_cookie(&mut headers, "tok", 900, true);

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("access_token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_clear_cookie() {
        let mut headers = HeaderMap::new();
        append_clear_cookie(&mut headers, ACCESS_TOKEN_COOKIE, false);

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_get_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("access_token=abc123; __csrf_token=xyz789"),
        );

        assert_eq!(
            get_cookie_value(&headers, "access_token"),
            Some("abc123".to_string())
        );
        assert_eq!(
            get_cookie_value(&headers, "__csrf_token"),
            Some("xyz789".to_string())
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }
}
