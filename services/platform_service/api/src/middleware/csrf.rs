use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use shared_error::ApiError;

use crate::cookie_helper::{build_cookie, get_cookie_value, CookieSpec, CSRF_COOKIE};
use crate::state::AppState;

const CSRF_HEADER: &str = "x-csrf-token";
const CSRF_MAX_AGE: i64 = 24 * 3600;

/// Double-submit CSRF
///
/// Every response guarantees a `__csrf_token` cookie exists (JS-readable so
/// the SPA can copy it into the header). Unsafe methods must present the
/// same value in `X-CSRF-Token`; the server only compares the two.
pub async fn csrf(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let cookie_token = get_cookie_value(req.headers(), CSRF_COOKIE);

    let unsafe_method = matches!(
        req.method().as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    );

    if unsafe_method {
        let header_token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let matches = match (&cookie_token, &header_token) {
            (Some(cookie), Some(header)) => !cookie.is_empty() && cookie == header,
            _ => false,
        };

        if !matches {
            let mut response = ApiError::forbidden("csrf_mismatch").into_response();
            ensure_cookie(&mut response, cookie_token.as_deref(), &state);
            return response;
        }
    }

    let mut response = next.run(req).await;
    ensure_cookie(&mut response, cookie_token.as_deref(), &state);
    response
}

fn ensure_cookie(response: &mut Response, existing: Option<&str>, state: &AppState) {
    if existing.is_some() {
        return;
    }

    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    if let Ok(value) = build_cookie(&CookieSpec {
        name: CSRF_COOKIE,
        value: &token,
        max_age: CSRF_MAX_AGE,
        http_only: false,
        secure: state.secure_cookies(),
        same_site: "Lax",
    }) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
