use chrono::{Duration, Utc};
use platform_service_core::domains::auth::domain::model::{RefreshToken, User};
use platform_service_core::domains::auth::domain::repository::RefreshTokenRepository;
use platform_service_core::domains::auth::utils::token_utils::{
    generate_refresh_token, sha256_hex,
};
use shared_error::ApiError;
use shared_jwt::{decode_access_token, encode_access_token, AccessClaims};
use uuid::Uuid;

/// Issues, rotates and revokes access+refresh pairs
///
/// Refresh tokens are opaque 32-byte values stored hash-at-rest. Every row
/// belongs to a family; rotation keeps the family, replay of a consumed
/// token burns it.
pub struct TokenService<RR>
where
    RR: RefreshTokenRepository,
{
    refresh_repo: RR,
    jwt_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl<RR> TokenService<RR>
where
    RR: RefreshTokenRepository,
{
    pub fn new(
        refresh_repo: RR,
        jwt_secret: String,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            refresh_repo,
            jwt_secret,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Mint an access token for the principal's current identity
    pub fn mint_access_token(&self, user: &User, roles: Vec<String>) -> Result<String, ApiError> {
        let claims = AccessClaims::new(
            user.user_id,
            user.email.clone(),
            user.name.clone(),
            roles,
            self.access_ttl_secs,
        );
        encode_access_token(&claims, &self.jwt_secret)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        decode_access_token(token, &self.jwt_secret)
    }

    /// Issue a fresh access+refresh pair with a new token family
    pub async fn issue_pair(
        &self,
        user: &User,
        roles: Vec<String>,
    ) -> Result<(String, String), ApiError> {
        let access_token = self.mint_access_token(user, roles)?;
        let refresh_token = self
            .insert_refresh_row(user.user_id, Uuid::new_v4())
            .await?;
        Ok((access_token, refresh_token))
    }

    /// Rotate a refresh token
    ///
    /// Returns the owning user id and the replacement raw token. Replay of
    /// a consumed token revokes the whole family; the caller re-reads the
    /// principal before minting the new access token so role changes take
    /// effect here.
    pub async fn rotate(&self, raw_refresh: &str) -> Result<(Uuid, String), ApiError> {
        let digest = sha256_hex(raw_refresh);

        let row = self
            .refresh_repo
            .find_by_hash(&digest)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid_token"))?;

        if row.is_expired() {
            return Err(ApiError::unauthorized("expired_token"));
        }

        if row.revoked {
            // Replay of an already-consumed token: burn the family
            let revoked = self.refresh_repo.revoke_family(row.family_id).await?;
            tracing::warn!(
                user_id = %row.user_id,
                family_id = %row.family_id,
                revoked,
                "refresh token reuse detected"
            );
            return Err(ApiError::unauthorized("token_reuse"));
        }

        if !self.refresh_repo.consume(&digest).await? {
            // Zero-row update: a concurrent rotation won the row between
            // our read and write. Same treatment as replay.
            let revoked = self.refresh_repo.revoke_family(row.family_id).await?;
            tracing::warn!(
                user_id = %row.user_id,
                family_id = %row.family_id,
                revoked,
                "refresh token rotation race lost"
            );
            return Err(ApiError::unauthorized("token_reuse"));
        }

        let new_raw = self.insert_refresh_row(row.user_id, row.family_id).await?;
        Ok((row.user_id, new_raw))
    }

    /// Revoke every refresh token of a principal (logout)
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        self.refresh_repo.revoke_all_for_user(user_id).await
    }

    async fn insert_refresh_row(&self, user_id: Uuid, family_id: Uuid) -> Result<String, ApiError> {
        let (raw, digest) = generate_refresh_token();
        let now = Utc::now();
        let row = RefreshToken {
            token_id: Uuid::now_v7(),
            user_id,
            token_hash: digest,
            family_id,
            revoked: false,
            expires_at: now + Duration::seconds(self.refresh_ttl_secs),
            created_at: now,
            revoked_at: None,
        };
        self.refresh_repo.create(&row).await?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        RefreshRepo {}

        #[async_trait]
        impl RefreshTokenRepository for RefreshRepo {
            async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, ApiError>;
            async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, ApiError>;
            async fn consume(&self, token_hash: &str) -> Result<bool, ApiError>;
            async fn revoke_family(&self, family_id: Uuid) -> Result<u64, ApiError>;
            async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError>;
            async fn delete_expired(&self) -> Result<u64, ApiError>;
        }
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            user_id: Uuid::new_v4(),
            email: "ada@x.io".to_string(),
            name: "Ada".to_string(),
            password_hash: None,
            avatar_url: None,
            email_verified: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn stored_row(raw: &str, user_id: Uuid, family_id: Uuid, revoked: bool) -> RefreshToken {
        let now = Utc::now();
        RefreshToken {
            token_id: Uuid::now_v7(),
            user_id,
            token_hash: sha256_hex(raw),
            family_id,
            revoked,
            expires_at: now + Duration::days(7),
            created_at: now,
            revoked_at: None,
        }
    }

    fn service(repo: MockRefreshRepo) -> TokenService<MockRefreshRepo> {
        TokenService::new(repo, "test_secret".to_string(), 900, 604_800)
    }

    #[tokio::test]
    async fn test_issue_pair_creates_fresh_family() {
        let mut repo = MockRefreshRepo::new();
        repo.expect_create()
            .withf(|row| !row.revoked && row.revoked_at.is_none())
            .returning(|row| Ok(row.clone()));

        let svc = service(repo);
        let user = test_user();
        let (access, refresh) = svc.issue_pair(&user, vec!["user".to_string()]).await.unwrap();

        let claims = svc.validate_access_token(&access).unwrap();
        assert_eq!(claims.user_id, user.user_id);
        assert_eq!(claims.roles, vec!["user".to_string()]);
        assert_eq!(refresh.len(), 43);
    }

    #[tokio::test]
    async fn test_rotate_unknown_token_is_invalid() {
        let mut repo = MockRefreshRepo::new();
        repo.expect_find_by_hash().returning(|_| Ok(None));

        let svc = service(repo);
        let err = svc.rotate("nonexistent").await.unwrap_err();
        assert_eq!(err.message(), "invalid_token");
    }

    #[tokio::test]
    async fn test_rotate_expired_token() {
        let user_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let mut row = stored_row("r1", user_id, family_id, false);
        row.expires_at = Utc::now() - Duration::hours(1);

        let mut repo = MockRefreshRepo::new();
        let returned = row.clone();
        repo.expect_find_by_hash()
            .returning(move |_| Ok(Some(returned.clone())));

        let svc = service(repo);
        let err = svc.rotate("r1").await.unwrap_err();
        assert_eq!(err.message(), "expired_token");
    }

    #[tokio::test]
    async fn test_rotate_replayed_token_burns_family() {
        let user_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let row = stored_row("r1", user_id, family_id, true);

        let mut repo = MockRefreshRepo::new();
        let returned = row.clone();
        repo.expect_find_by_hash()
            .returning(move |_| Ok(Some(returned.clone())));
        repo.expect_revoke_family()
            .with(eq(family_id))
            .times(1)
            .returning(|_| Ok(2));

        let svc = service(repo);
        let err = svc.rotate("r1").await.unwrap_err();
        assert_eq!(err.message(), "token_reuse");
    }

    #[tokio::test]
    async fn test_rotate_lost_race_burns_family() {
        let user_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let row = stored_row("r1", user_id, family_id, false);

        let mut repo = MockRefreshRepo::new();
        let returned = row.clone();
        repo.expect_find_by_hash()
            .returning(move |_| Ok(Some(returned.clone())));
        // The other rotation consumed the row first
        repo.expect_consume().returning(|_| Ok(false));
        repo.expect_revoke_family()
            .with(eq(family_id))
            .times(1)
            .returning(|_| Ok(1));

        let svc = service(repo);
        let err = svc.rotate("r1").await.unwrap_err();
        assert_eq!(err.message(), "token_reuse");
    }

    #[tokio::test]
    async fn test_rotate_keeps_family() {
        let user_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let row = stored_row("r1", user_id, family_id, false);

        let mut repo = MockRefreshRepo::new();
        let returned = row.clone();
        repo.expect_find_by_hash()
            .returning(move |_| Ok(Some(returned.clone())));
        repo.expect_consume().returning(|_| Ok(true));
        repo.expect_create()
            .withf(move |new_row| new_row.family_id == family_id && !new_row.revoked)
            .times(1)
            .returning(|row| Ok(row.clone()));

        let svc = service(repo);
        let (owner, new_raw) = svc.rotate("r1").await.unwrap();
        assert_eq!(owner, user_id);
        assert_ne!(new_raw, "r1");
    }
}
