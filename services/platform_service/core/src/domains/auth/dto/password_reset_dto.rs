use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Request a password reset email
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordReq {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Consume a reset token and set a new password
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordReq {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    /// Checked against the password policy, not by the validator derive
    pub password: String,
}
