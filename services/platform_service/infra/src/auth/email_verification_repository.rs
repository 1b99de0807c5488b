use async_trait::async_trait;
use platform_service_core::domains::auth::domain::{
    model::EmailVerificationToken, repository::EmailVerificationRepository,
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of EmailVerificationRepository
#[derive(Clone)]
pub struct PgEmailVerificationRepository {
    pool: PgPool,
}

impl PgEmailVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailVerificationRepository for PgEmailVerificationRepository {
    async fn create(
        &self,
        token: &EmailVerificationToken,
    ) -> Result<EmailVerificationToken, ApiError> {
        let token = sqlx::query_as::<_, EmailVerificationToken>(
            r#"
            INSERT INTO email_verification_tokens (
                token_id, user_id, token_hash, expires_at, created_at, used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.used_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(token)
    }

    async fn consume_and_verify(&self, token_hash: &str) -> Result<Option<Uuid>, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Claim the token; the WHERE clause makes the consumption one-shot
        // even with concurrent consumers.
        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE email_verification_tokens
            SET used_at = NOW()
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE users SET email_verified = true, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }
}
