use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

const MAX_AGE_SECS: &str = "600";

/// CORS with an exact-match allow-list
///
/// The origin is reflected only when allow-listed (or the list is `*`);
/// preflights short-circuit with 204. `X-Request-ID` is always exposed so
/// browser clients can correlate errors.
pub async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let allowed = state.config.allowed_origins();
    let allow_any = allowed.iter().any(|o| o == "*");
    let origin_allowed = origin
        .as_deref()
        .map(|o| allow_any || allowed.iter().any(|a| a == o))
        .unwrap_or(false);

    let is_preflight = req.method() == Method::OPTIONS;

    let mut response = if is_preflight {
        let mut preflight = StatusCode::NO_CONTENT.into_response();
        preflight.headers_mut().insert(
            "access-control-allow-methods",
            HeaderValue::from_static("GET, POST, PUT, PATCH, DELETE, OPTIONS"),
        );
        preflight.headers_mut().insert(
            "access-control-allow-headers",
            HeaderValue::from_static("authorization, content-type, x-csrf-token, x-request-id"),
        );
        preflight.headers_mut().insert(
            "access-control-max-age",
            HeaderValue::from_static(MAX_AGE_SECS),
        );
        preflight
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    if origin_allowed {
        if let Some(origin) = origin {
            if let Ok(value) = HeaderValue::from_str(&origin) {
                headers.insert("access-control-allow-origin", value);
                headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            }
            if state.config.cors_allow_credentials {
                headers.insert(
                    "access-control-allow-credentials",
                    HeaderValue::from_static("true"),
                );
            }
        }
    }
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static("x-request-id"),
    );

    response
}
