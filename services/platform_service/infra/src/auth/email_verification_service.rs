use async_trait::async_trait;
use chrono::{Duration, Utc};
use platform_service_core::domains::auth::{
    domain::{
        model::EmailVerificationToken,
        repository::{EmailVerificationRepository, UserRepository},
        service::EmailVerificationService,
    },
    utils::token_utils::{generate_credential_token, sha256_hex},
};
use shared_error::ApiError;
use std::sync::Arc;
use uuid::Uuid;

use super::smtp_sender::{EmailMessage, EmailSender};

/// Email verification flow implementation
///
/// Tokens are one-shot, hash-at-rest, and expire after 24 hours by default.
pub struct EmailVerificationServiceImpl<EVR, UR>
where
    EVR: EmailVerificationRepository,
    UR: UserRepository,
{
    verification_repo: EVR,
    user_repo: UR,
    sender: Arc<dyn EmailSender>,
    frontend_url: String,
    ttl_secs: i64,
}

impl<EVR, UR> EmailVerificationServiceImpl<EVR, UR>
where
    EVR: EmailVerificationRepository,
    UR: UserRepository,
{
    pub fn new(
        verification_repo: EVR,
        user_repo: UR,
        sender: Arc<dyn EmailSender>,
        frontend_url: String,
        ttl_secs: i64,
    ) -> Self {
        Self {
            verification_repo,
            user_repo,
            sender,
            frontend_url,
            ttl_secs,
        }
    }

    fn verification_link(&self, raw_token: &str) -> String {
        format!(
            "{}/verify-email?token={}",
            self.frontend_url.trim_end_matches('/'),
            raw_token
        )
    }

    async fn issue_and_send(&self, user_id: Uuid, email: &str) -> Result<(), ApiError> {
        let (raw, digest) = generate_credential_token();
        let now = Utc::now();
        let token = EmailVerificationToken {
            token_id: Uuid::now_v7(),
            user_id,
            token_hash: digest,
            expires_at: now + Duration::seconds(self.ttl_secs),
            created_at: now,
            used_at: None,
        };
        self.verification_repo.create(&token).await?;

        let link = self.verification_link(&raw);
        let message = EmailMessage {
            to: email.to_string(),
            subject: "Verify your email address".to_string(),
            html_body: format!(
                "<p>Welcome! Confirm your email address by opening \
                 <a href=\"{link}\">this link</a>. It expires in 24 hours.</p>"
            ),
            text_body: format!(
                "Welcome! Confirm your email address by opening {link} . \
                 The link expires in 24 hours."
            ),
        };

        // Send failures are logged, never surfaced
        if let Err(e) = self.sender.send(message).await {
            tracing::warn!(email = %email, error = %e, "verification email not sent");
        }
        Ok(())
    }
}

#[async_trait]
impl<EVR, UR> EmailVerificationService for EmailVerificationServiceImpl<EVR, UR>
where
    EVR: EmailVerificationRepository + Send + Sync,
    UR: UserRepository + Send + Sync,
{
    async fn send_verification(&self, user_id: Uuid, email: &str) -> Result<(), ApiError> {
        self.issue_and_send(user_id, email).await
    }

    async fn verify_email(&self, raw_token: &str) -> Result<(), ApiError> {
        let digest = sha256_hex(raw_token);
        match self.verification_repo.consume_and_verify(&digest).await? {
            Some(user_id) => {
                tracing::info!(user_id = %user_id, "email verified");
                Ok(())
            }
            None => Err(ApiError::bad_request("invalid_or_expired")),
        }
    }

    async fn resend(&self, email: &str) -> Result<(), ApiError> {
        // Silent for unknown or already verified addresses
        match self.user_repo.find_by_email(email).await? {
            Some(user) if !user.email_verified => {
                self.issue_and_send(user.user_id, &user.email).await
            }
            _ => Ok(()),
        }
    }
}
