use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Consume a verification token
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailReq {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

/// Ask for a fresh verification email
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResendVerificationReq {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}
