use async_trait::async_trait;
use platform_service_core::domains::auth::domain::{
    model::OAuthAccount, repository::OAuthAccountRepository,
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of OAuthAccountRepository
#[derive(Clone)]
pub struct PgOAuthAccountRepository {
    pool: PgPool,
}

impl PgOAuthAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OAuthAccountRepository for PgOAuthAccountRepository {
    async fn find_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthAccount>, ApiError> {
        let account = sqlx::query_as::<_, OAuthAccount>(
            "SELECT * FROM oauth_accounts WHERE provider = $1 AND provider_user_id = $2",
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OAuthAccount>, ApiError> {
        let accounts = sqlx::query_as::<_, OAuthAccount>(
            "SELECT * FROM oauth_accounts WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM oauth_accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn create(&self, account: &OAuthAccount) -> Result<OAuthAccount, ApiError> {
        let account = sqlx::query_as::<_, OAuthAccount>(
            r#"
            INSERT INTO oauth_accounts (
                account_id, user_id, provider, provider_user_id, email,
                avatar_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(account.account_id)
        .bind(account.user_id)
        .bind(&account.provider)
        .bind(&account.provider_user_id)
        .bind(&account.email)
        .bind(&account.avatar_url)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    async fn delete(&self, user_id: Uuid, provider: &str) -> Result<bool, ApiError> {
        let result =
            sqlx::query("DELETE FROM oauth_accounts WHERE user_id = $1 AND provider = $2")
                .bind(user_id)
                .bind(provider)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
