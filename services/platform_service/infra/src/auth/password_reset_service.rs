use async_trait::async_trait;
use chrono::{Duration, Utc};
use platform_service_core::domains::auth::{
    domain::{
        model::PasswordResetToken,
        repository::{PasswordResetRepository, RefreshTokenRepository, UserRepository},
        service::PasswordResetService,
    },
    utils::{
        password_policy::validate_password,
        token_utils::{generate_credential_token, sha256_hex},
    },
};
use shared_error::ApiError;
use std::sync::Arc;
use uuid::Uuid;

use super::smtp_sender::{EmailMessage, EmailSender};

/// Forgot-password flow implementation
///
/// Requests answer identically whether or not the address exists. Tokens
/// are one-shot and expire after 15 minutes by default; a successful reset
/// revokes the user's refresh tokens and every other outstanding reset
/// token.
pub struct PasswordResetServiceImpl<PRR, UR, RR>
where
    PRR: PasswordResetRepository,
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    reset_repo: PRR,
    user_repo: UR,
    refresh_repo: RR,
    sender: Arc<dyn EmailSender>,
    frontend_url: String,
    ttl_secs: i64,
}

impl<PRR, UR, RR> PasswordResetServiceImpl<PRR, UR, RR>
where
    PRR: PasswordResetRepository,
    UR: UserRepository,
    RR: RefreshTokenRepository,
{
    pub fn new(
        reset_repo: PRR,
        user_repo: UR,
        refresh_repo: RR,
        sender: Arc<dyn EmailSender>,
        frontend_url: String,
        ttl_secs: i64,
    ) -> Self {
        Self {
            reset_repo,
            user_repo,
            refresh_repo,
            sender,
            frontend_url,
            ttl_secs,
        }
    }

    fn reset_link(&self, raw_token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.frontend_url.trim_end_matches('/'),
            raw_token
        )
    }
}

#[async_trait]
impl<PRR, UR, RR> PasswordResetService for PasswordResetServiceImpl<PRR, UR, RR>
where
    PRR: PasswordResetRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
    RR: RefreshTokenRepository + Send + Sync,
{
    async fn request_reset(&self, email: &str) -> Result<(), ApiError> {
        let user = match self.user_repo.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Unknown address: same outcome, nothing to do
                tracing::debug!(email = %email, "password reset requested for unknown email");
                return Ok(());
            }
        };

        // Outstanding tokens die when a new one is issued
        self.reset_repo
            .invalidate_all_for_user(user.user_id)
            .await?;

        let (raw, digest) = generate_credential_token();
        let now = Utc::now();
        let token = PasswordResetToken {
            token_id: Uuid::now_v7(),
            user_id: user.user_id,
            token_hash: digest,
            expires_at: now + Duration::seconds(self.ttl_secs),
            created_at: now,
            used_at: None,
        };
        self.reset_repo.create(&token).await?;

        let link = self.reset_link(&raw);
        let message = EmailMessage {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            html_body: format!(
                "<p>A password reset was requested for this address. \
                 <a href=\"{link}\">Set a new password</a> within 15 minutes, \
                 or ignore this email.</p>"
            ),
            text_body: format!(
                "A password reset was requested for this address. Open {link} \
                 within 15 minutes to set a new password, or ignore this email."
            ),
        };

        // Send failures are logged, never surfaced
        if let Err(e) = self.sender.send(message).await {
            tracing::warn!(user_id = %user.user_id, error = %e, "reset email not sent");
        }
        Ok(())
    }

    async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), ApiError> {
        validate_password(new_password)?;

        let digest = sha256_hex(raw_token);
        let new_hash = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

        match self.reset_repo.consume_and_reset(&digest, &new_hash).await? {
            Some(user_id) => {
                // Active sessions do not survive a password reset
                let revoked = self.refresh_repo.revoke_all_for_user(user_id).await?;
                tracing::info!(user_id = %user_id, revoked, "password reset completed");
                Ok(())
            }
            None => Err(ApiError::bad_request("invalid_or_expired")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use platform_service_core::domains::auth::domain::model::{RefreshToken, User};

    mock! {
        ResetRepo {}

        #[async_trait]
        impl PasswordResetRepository for ResetRepo {
            async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken, ApiError>;
            async fn consume_and_reset(&self, token_hash: &str, new_password_hash: &str) -> Result<Option<Uuid>, ApiError>;
            async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError>;
        }
    }

    mock! {
        Users {}

        #[async_trait]
        impl UserRepository for Users {
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
            async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
            async fn email_exists(&self, email: &str) -> Result<bool, ApiError>;
            async fn create(&self, user: &User) -> Result<User, ApiError>;
            async fn update(&self, user: &User) -> Result<User, ApiError>;
            async fn soft_delete(&self, id: Uuid) -> Result<bool, ApiError>;
        }
    }

    mock! {
        Refresh {}

        #[async_trait]
        impl RefreshTokenRepository for Refresh {
            async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, ApiError>;
            async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, ApiError>;
            async fn consume(&self, token_hash: &str) -> Result<bool, ApiError>;
            async fn revoke_family(&self, family_id: Uuid) -> Result<u64, ApiError>;
            async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError>;
            async fn delete_expired(&self) -> Result<u64, ApiError>;
        }
    }

    struct NullSender;

    #[async_trait]
    impl EmailSender for NullSender {
        async fn send(&self, _message: EmailMessage) -> Result<(), ApiError> {
            Ok(())
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    fn service(
        reset: MockResetRepo,
        users: MockUsers,
        refresh: MockRefresh,
    ) -> PasswordResetServiceImpl<MockResetRepo, MockUsers, MockRefresh> {
        PasswordResetServiceImpl::new(
            reset,
            users,
            refresh,
            Arc::new(NullSender),
            "https://app.example.com".to_string(),
            900,
        )
    }

    #[tokio::test]
    async fn test_request_for_unknown_email_succeeds() {
        let mut users = MockUsers::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let svc = service(MockResetRepo::new(), users, MockRefresh::new());
        assert!(svc.request_reset("ghost@x.io").await.is_ok());
    }

    #[tokio::test]
    async fn test_request_invalidates_previous_tokens() {
        let user_id = Uuid::new_v4();
        let mut users = MockUsers::new();
        users.expect_find_by_email().returning(move |_| {
            let now = Utc::now();
            Ok(Some(User {
                user_id,
                email: "ada@x.io".to_string(),
                name: "Ada".to_string(),
                password_hash: Some("x".repeat(60)),
                avatar_url: None,
                email_verified: true,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            }))
        });

        let mut reset = MockResetRepo::new();
        reset
            .expect_invalidate_all_for_user()
            .times(1)
            .returning(|_| Ok(1));
        reset.expect_create().times(1).returning(|t| Ok(t.clone()));

        let svc = service(reset, users, MockRefresh::new());
        svc.request_reset("ada@x.io").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_applies_policy_before_touching_storage() {
        let svc = service(MockResetRepo::new(), MockUsers::new(), MockRefresh::new());
        let err = svc.reset_password("sometoken", "weak").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reset_unknown_token() {
        let mut reset = MockResetRepo::new();
        reset
            .expect_consume_and_reset()
            .returning(|_, _| Ok(None));

        let svc = service(reset, MockUsers::new(), MockRefresh::new());
        let err = svc
            .reset_password("sometoken", "LovelaceBytes#9")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "invalid_or_expired");
    }

    #[tokio::test]
    async fn test_reset_revokes_refresh_tokens() {
        let user_id = Uuid::new_v4();

        let mut reset = MockResetRepo::new();
        reset
            .expect_consume_and_reset()
            .returning(move |_, _| Ok(Some(user_id)));

        let mut refresh = MockRefresh::new();
        refresh
            .expect_revoke_all_for_user()
            .times(1)
            .returning(|_| Ok(2));

        let svc = service(reset, MockUsers::new(), refresh);
        svc.reset_password("sometoken", "LovelaceBytes#9")
            .await
            .unwrap();
    }
}
