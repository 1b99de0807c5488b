use axum::extract::State;
use axum::Json;
use platform_service_core::domains::auth::dto::auth_dto::MessageResp;
use platform_service_core::domains::auth::dto::password_reset_dto::{
    ForgotPasswordReq, ResetPasswordReq,
};
use shared_error::{ApiError, ApiResponse};
use validator::Validate;

use crate::state::AppState;

/// Request a password reset email
///
/// Always answers the same generic success, regardless of whether the
/// address exists; send failures are logged, never surfaced.
#[utoipa::path(
    post,
    path = "/api/v1/auth/request-reset",
    tag = "auth",
    request_body = ForgotPasswordReq,
    responses((status = 200, description = "Acknowledged", body = MessageResp))
)]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordReq>,
) -> Result<ApiResponse<MessageResp>, ApiError> {
    payload.validate()?;

    state.password_reset.request_reset(&payload.email).await?;
    Ok(ApiResponse::success(MessageResp::new(
        "If an account exists for this email, a reset link has been sent.",
    )))
}

/// Consume a reset token and set the new password
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password replaced", body = MessageResp),
        (status = 400, description = "Invalid token or weak password"),
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordReq>,
) -> Result<ApiResponse<MessageResp>, ApiError> {
    payload.validate()?;

    state
        .password_reset
        .reset_password(&payload.token, &payload.password)
        .await?;
    Ok(ApiResponse::success(MessageResp::new("password updated")))
}
