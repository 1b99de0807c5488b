use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Principal entity
///
/// The authenticated identity. `password_hash` is NULL for federated-only
/// accounts; soft-deleted rows keep their email reserved.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// True when the account carries a usable password credential
    ///
    /// bcrypt output is at least 60 bytes; anything shorter is a
    /// placeholder written by federation.
    pub fn has_password(&self) -> bool {
        self.password_hash
            .as_deref()
            .map(|h| h.len() >= 60)
            .unwrap_or(false)
    }
}

/// System role row (seeded, immutable after seed)
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
}

/// Refresh token entity
///
/// Stored hash-at-rest only. `family_id` groups every token descended from
/// one initial issuance; a replay of a revoked member revokes the whole
/// family.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub family_id: Uuid,
    pub revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

/// Email verification token
///
/// One-shot, hash-at-rest, 24-hour lifetime.
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerificationToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Password reset token
///
/// One-shot, hash-at-rest, 15-minute lifetime. Consuming one marks every
/// other unused reset token of the same principal as used.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_used()
    }
}

/// Federated identity bound to a principal
///
/// `(provider, provider_user_id)` is unique across the system.
#[derive(Debug, Clone, FromRow)]
pub struct OAuthAccount {
    pub account_id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
