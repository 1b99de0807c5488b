use axum::extract::State;
use axum::Json;
use platform_service_core::domains::auth::dto::auth_dto::UserInfo;
use platform_service_core::domains::auth::dto::user_dto::UpdateProfileReq;
use shared_auth::AuthUser;
use shared_error::{ApiError, ApiResponse};
use validator::Validate;

use crate::state::AppState;

/// Current principal, read fresh from storage
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Profile", body = UserInfo))
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<UserInfo>, ApiError> {
    let stored = state
        .user_repo
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(ApiResponse::success(UserInfo::from_user(
        &stored,
        user.roles,
    )))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileReq,
    responses((status = 200, description = "Updated profile", body = UserInfo))
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileReq>,
) -> Result<ApiResponse<UserInfo>, ApiError> {
    payload.validate()?;

    let mut stored = state
        .user_repo
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if let Some(name) = payload.name {
        stored.name = name;
    }
    if let Some(avatar_url) = payload.avatar_url {
        stored.avatar_url = Some(avatar_url);
    }

    let updated = state.user_repo.update(&stored).await?;
    Ok(ApiResponse::success(UserInfo::from_user(
        &updated, user.roles,
    )))
}
