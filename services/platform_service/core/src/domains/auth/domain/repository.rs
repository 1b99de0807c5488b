use async_trait::async_trait;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{EmailVerificationToken, OAuthAccount, PasswordResetToken, RefreshToken, User};

/// User repository
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn email_exists(&self, email: &str) -> Result<bool, ApiError>;

    async fn create(&self, user: &User) -> Result<User, ApiError>;

    async fn update(&self, user: &User) -> Result<User, ApiError>;

    async fn soft_delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// System role assignments
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Role names bound to a principal, e.g. `["user"]`
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, ApiError>;

    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), ApiError>;
}

/// Refresh token storage
///
/// `consume` is the single-writer transition from valid to revoked: it
/// updates `WHERE token_hash = ? AND revoked = false` and reports whether
/// this caller won the row.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, ApiError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, ApiError>;

    /// Mark the row revoked iff it is not already; true when this caller
    /// performed the transition
    async fn consume(&self, token_hash: &str) -> Result<bool, ApiError>;

    /// Revoke every non-revoked member of a family; returns rows revoked
    async fn revoke_family(&self, family_id: Uuid) -> Result<u64, ApiError>;

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError>;

    /// Sweep expired rows; optional, expiry is also checked at use time
    async fn delete_expired(&self) -> Result<u64, ApiError>;
}

/// Email verification token storage
#[async_trait]
pub trait EmailVerificationRepository: Send + Sync {
    async fn create(&self, token: &EmailVerificationToken)
        -> Result<EmailVerificationToken, ApiError>;

    /// One transaction: find unused+unexpired by hash, mark used, flip the
    /// user's `email_verified`. Returns the user id, or None when no such
    /// token qualifies.
    async fn consume_and_verify(&self, token_hash: &str) -> Result<Option<Uuid>, ApiError>;
}

/// Password reset token storage
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken, ApiError>;

    /// One transaction: find unused+unexpired by hash, mark used, replace
    /// the user's password hash, and mark every other unused reset token of
    /// the same user as used. Returns the user id, or None when no such
    /// token qualifies.
    async fn consume_and_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, ApiError>;

    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError>;
}

/// Federated account storage
#[async_trait]
pub trait OAuthAccountRepository: Send + Sync {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthAccount>, ApiError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OAuthAccount>, ApiError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, ApiError>;

    async fn create(&self, account: &OAuthAccount) -> Result<OAuthAccount, ApiError>;

    async fn delete(&self, user_id: Uuid, provider: &str) -> Result<bool, ApiError>;
}
