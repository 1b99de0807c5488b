use async_trait::async_trait;
use platform_service_core::domains::auth::domain::{
    model::RefreshToken, repository::RefreshTokenRepository,
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of RefreshTokenRepository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, ApiError> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (
                token_id, user_id, token_hash, family_id, revoked,
                expires_at, created_at, revoked_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.family_id)
        .bind(token.revoked)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(token.revoked_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, ApiError> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn consume(&self, token_hash: &str) -> Result<bool, ApiError> {
        // Conditional update: only one of two racing rotations observes a
        // row transition here; the loser must treat the token as replayed.
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true, revoked_at = NOW()
             WHERE token_hash = $1 AND revoked = false",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true, revoked_at = NOW()
             WHERE family_id = $1 AND revoked = false",
        )
        .bind(family_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = true, revoked_at = NOW()
             WHERE user_id = $1 AND revoked = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
