use axum::extract::State;
use axum::Json;
use platform_service_core::domains::auth::dto::auth_dto::MessageResp;
use platform_service_core::domains::auth::dto::email_verification_dto::{
    ResendVerificationReq, VerifyEmailReq,
};
use shared_error::{ApiError, ApiResponse};
use validator::Validate;

use crate::state::AppState;

/// Consume an email verification token
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    tag = "auth",
    request_body = VerifyEmailReq,
    responses(
        (status = 200, description = "Email verified", body = MessageResp),
        (status = 400, description = "Invalid or expired token"),
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailReq>,
) -> Result<ApiResponse<MessageResp>, ApiError> {
    payload.validate()?;

    state.verification.verify_email(&payload.token).await?;
    Ok(ApiResponse::success(MessageResp::new("email verified")))
}

/// Re-send the verification email
///
/// The response is the same whether or not the address exists or is
/// already verified.
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    tag = "auth",
    request_body = ResendVerificationReq,
    responses((status = 200, description = "Acknowledged", body = MessageResp))
)]
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<ResendVerificationReq>,
) -> Result<ApiResponse<MessageResp>, ApiError> {
    payload.validate()?;

    state.verification.resend(&payload.email).await?;
    Ok(ApiResponse::success(MessageResp::new(
        "If the address needs verification, an email is on its way.",
    )))
}
