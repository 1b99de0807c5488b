use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use platform_service_core::domains::auth::dto::auth_dto::{
    AuthResp, LoginReq, MessageResp, RefreshReq, RegisterReq,
};
use serde_json::json;
use shared_auth::AuthUser;
use shared_error::{ApiError, ApiResponse};
use validator::Validate;

use crate::cookie_helper::{append_access_cookie, append_clear_cookie, ACCESS_TOKEN_COOKIE};
use crate::state::AppState;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Service is alive"))
)]
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe: one database round trip
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 500, description = "Database unreachable"),
    )
)]
pub async fn readyz(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    shared_db::ping(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Register a new principal
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Registered, tokens issued", body = AuthResp),
        (status = 400, description = "Password policy or validation failure"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterReq>,
) -> Result<(HeaderMap, ApiResponse<AuthResp>), ApiError> {
    payload.validate()?;

    let resp = state.auth_provider.register(payload).await?;

    let mut headers = HeaderMap::new();
    append_access_cookie(
        &mut headers,
        &resp.access_token,
        resp.expires_in,
        state.secure_cookies(),
    );
    Ok((headers, ApiResponse::success(resp)))
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Authenticated", body = AuthResp),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginReq>,
) -> Result<(HeaderMap, ApiResponse<AuthResp>), ApiError> {
    payload.validate()?;

    let resp = state.auth_provider.login(payload).await?;

    let mut headers = HeaderMap::new();
    append_access_cookie(
        &mut headers,
        &resp.access_token,
        resp.expires_in,
        state.secure_cookies(),
    );
    Ok((headers, ApiResponse::success(resp)))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshReq,
    responses(
        (status = 200, description = "Pair rotated", body = AuthResp),
        (status = 401, description = "Invalid, expired or replayed token"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshReq>,
) -> Result<(HeaderMap, ApiResponse<AuthResp>), ApiError> {
    payload.validate()?;

    let resp = state.auth_provider.refresh(&payload.refresh_token).await?;

    let mut headers = HeaderMap::new();
    append_access_cookie(
        &mut headers,
        &resp.access_token,
        resp.expires_in,
        state.secure_cookies(),
    );
    Ok((headers, ApiResponse::success(resp)))
}

/// Revoke the caller's refresh tokens
///
/// The access token stays valid until its `exp`; only refresh state is
/// revoked.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Logged out", body = MessageResp))
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(HeaderMap, ApiResponse<MessageResp>), ApiError> {
    // Best-effort; a provider hiccup must not trap the user logged in
    if let Err(e) = state.auth_provider.logout(user.user_id).await {
        tracing::warn!(user_id = %user.user_id, error = %e, "logout incomplete");
    }

    let mut headers = HeaderMap::new();
    append_clear_cookie(&mut headers, ACCESS_TOKEN_COOKIE, state.secure_cookies());
    Ok((headers, ApiResponse::success(MessageResp::new("logged out"))))
}
