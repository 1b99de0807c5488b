use async_trait::async_trait;
use platform_service_core::domains::auth::domain::{
    model::PasswordResetToken, repository::PasswordResetRepository,
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of PasswordResetRepository
#[derive(Clone)]
pub struct PgPasswordResetRepository {
    pool: PgPool,
}

impl PgPasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken, ApiError> {
        let token = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (
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

    async fn consume_and_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Claim the token; one-shot under concurrency
        let row: Option<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING token_id, user_id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((token_id, user_id)) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(new_password_hash)
        .execute(&mut *tx)
        .await?;

        // Every other outstanding reset token of this user dies with this one
        sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE user_id = $1 AND token_id <> $2 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(token_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }

    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW()
             WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
