use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use shared_auth::AuthUser;
use shared_error::ApiError;

use crate::cookie_helper::{get_cookie_value, ACCESS_TOKEN_COOKIE};
use crate::state::AppState;

/// Token authentication
///
/// The bearer header wins; the `access_token` cookie is the fallback for
/// clients that cannot hold the token. Validation goes through the
/// configured auth provider, so local and external tokens take the same
/// path. Claims and the projected `AuthUser` land in the request
/// extensions for extractors downstream.
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string());

    let token = match bearer {
        Some(token) => token,
        None => get_cookie_value(req.headers(), ACCESS_TOKEN_COOKIE)
            .ok_or_else(|| ApiError::unauthorized("missing_token"))?,
    };

    let claims = state.auth_provider.validate_token(&token).await?;

    let user = AuthUser::from_claims(&claims);
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
