use async_trait::async_trait;
use shared_error::ApiError;
use shared_jwt::AccessClaims;
use uuid::Uuid;

use crate::domains::auth::domain::model::OAuthAccount;
use crate::domains::auth::dto::auth_dto::{AuthResp, LoginReq, RegisterReq};
use crate::domains::auth::dto::oauth_dto::FederatedProfile;

/// Auth provider contract
///
/// Polymorphic over the local implementation and the external identity
/// provider. Both produce the same `AccessClaims`, so everything past token
/// validation is provider-agnostic.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create a principal and return an access+refresh pair
    async fn register(&self, req: RegisterReq) -> Result<AuthResp, ApiError>;

    /// Authenticate with email+password
    ///
    /// Every credential failure is the same `UNAUTHORIZED`; callers never
    /// learn whether the account exists.
    async fn login(&self, req: LoginReq) -> Result<AuthResp, ApiError>;

    /// Validate an access token and return its claims
    async fn validate_token(&self, token: &str) -> Result<AccessClaims, ApiError>;

    /// Rotate a refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResp, ApiError>;

    /// Revoke the principal's refresh tokens; best-effort, never fatal
    async fn logout(&self, user_id: Uuid) -> Result<(), ApiError>;
}

/// Email verification flow
#[async_trait]
pub trait EmailVerificationService: Send + Sync {
    /// Issue a token and email the verification link
    async fn send_verification(&self, user_id: Uuid, email: &str) -> Result<(), ApiError>;

    /// Consume a raw token; flips `email_verified` exactly once
    async fn verify_email(&self, raw_token: &str) -> Result<(), ApiError>;

    /// Re-issue for an address; silently succeeds for unknown or already
    /// verified addresses
    async fn resend(&self, email: &str) -> Result<(), ApiError>;
}

/// Forgot-password flow
#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Issue a reset token and email the link; the response is identical
    /// whether or not the address exists
    async fn request_reset(&self, email: &str) -> Result<(), ApiError>;

    /// Consume a raw token, set the new password, revoke the user's refresh
    /// tokens and every other unused reset token
    async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), ApiError>;
}

/// OAuth federation: find-or-create-or-link plus account management
#[async_trait]
pub trait FederationService: Send + Sync {
    /// Resolve a provider profile to a principal and mint a token pair
    async fn federated_sign_in(&self, profile: FederatedProfile) -> Result<AuthResp, ApiError>;

    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<OAuthAccount>, ApiError>;

    /// Unlink a provider; refused when it is the last auth method
    async fn unlink(&self, user_id: Uuid, provider: &str) -> Result<(), ApiError>;
}
