use async_trait::async_trait;
use chrono::Utc;
use platform_service_core::domains::auth::{
    domain::{
        model::{OAuthAccount, User},
        repository::{
            OAuthAccountRepository, RefreshTokenRepository, RoleRepository, UserRepository,
        },
        service::FederationService,
    },
    dto::auth_dto::{AuthResp, UserInfo},
    dto::oauth_dto::FederatedProfile,
};
use shared_error::ApiError;
use uuid::Uuid;

use super::token_service::TokenService;

/// Find-or-create-or-link federation
pub struct FederationServiceImpl<UR, RoR, OAR, RR>
where
    UR: UserRepository,
    RoR: RoleRepository,
    OAR: OAuthAccountRepository,
    RR: RefreshTokenRepository,
{
    user_repo: UR,
    role_repo: RoR,
    oauth_repo: OAR,
    token_service: TokenService<RR>,
}

impl<UR, RoR, OAR, RR> FederationServiceImpl<UR, RoR, OAR, RR>
where
    UR: UserRepository,
    RoR: RoleRepository,
    OAR: OAuthAccountRepository,
    RR: RefreshTokenRepository,
{
    pub fn new(
        user_repo: UR,
        role_repo: RoR,
        oauth_repo: OAR,
        token_service: TokenService<RR>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            oauth_repo,
            token_service,
        }
    }

    async fn create_account_row(
        &self,
        user_id: Uuid,
        profile: &FederatedProfile,
    ) -> Result<OAuthAccount, ApiError> {
        let now = Utc::now();
        self.oauth_repo
            .create(&OAuthAccount {
                account_id: Uuid::now_v7(),
                user_id,
                provider: profile.provider.clone(),
                provider_user_id: profile.provider_user_id.clone(),
                email: profile.email.clone(),
                avatar_url: profile.avatar_url.clone(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Resolve the profile to a principal, creating or linking as needed
    async fn resolve_user(&self, profile: &FederatedProfile) -> Result<User, ApiError> {
        // Known federated identity
        if let Some(account) = self
            .oauth_repo
            .find_by_provider(&profile.provider, &profile.provider_user_id)
            .await?
        {
            return self
                .user_repo
                .find_by_id(account.user_id)
                .await?
                .ok_or_else(|| ApiError::internal("oauth account points at a missing user"));
        }

        let email = profile
            .email
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("provider returned no verified email"))?;

        // Same verified email: link to the existing principal
        if let Some(mut user) = self.user_repo.find_by_email(email).await? {
            self.create_account_row(user.user_id, profile).await?;

            let mut dirty = false;
            if !user.email_verified {
                // The provider vouched for this address
                user.email_verified = true;
                dirty = true;
            }
            if user.avatar_url.is_none() && profile.avatar_url.is_some() {
                user.avatar_url = profile.avatar_url.clone();
                dirty = true;
            }
            if dirty {
                user = self.user_repo.update(&user).await?;
            }
            return Ok(user);
        }

        // Brand new principal, federated-only (no password)
        let now = Utc::now();
        let user = User {
            user_id: Uuid::now_v7(),
            email: email.to_string(),
            name: profile
                .name
                .clone()
                .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string()),
            password_hash: None,
            avatar_url: profile.avatar_url.clone(),
            email_verified: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self.user_repo.create(&user).await?;
        self.role_repo.assign_role(created.user_id, "user").await?;
        self.create_account_row(created.user_id, profile).await?;

        tracing::info!(
            user_id = %created.user_id,
            provider = %profile.provider,
            "created principal from federation"
        );
        Ok(created)
    }
}

#[async_trait]
impl<UR, RoR, OAR, RR> FederationService for FederationServiceImpl<UR, RoR, OAR, RR>
where
    UR: UserRepository + Send + Sync,
    RoR: RoleRepository + Send + Sync,
    OAR: OAuthAccountRepository + Send + Sync,
    RR: RefreshTokenRepository + Send + Sync,
{
    async fn federated_sign_in(&self, profile: FederatedProfile) -> Result<AuthResp, ApiError> {
        let user = self.resolve_user(&profile).await?;
        let roles = self.role_repo.roles_for_user(user.user_id).await?;
        let (access_token, refresh_token) =
            self.token_service.issue_pair(&user, roles.clone()).await?;

        Ok(AuthResp {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_ttl_secs(),
            user: UserInfo::from_user(&user, roles),
        })
    }

    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<OAuthAccount>, ApiError> {
        self.oauth_repo.list_for_user(user_id).await
    }

    async fn unlink(&self, user_id: Uuid, provider: &str) -> Result<(), ApiError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        let linked = self.oauth_repo.count_for_user(user_id).await?;

        // At least one way back in must remain
        if linked <= 1 && !user.has_password() {
            return Err(ApiError::bad_request("last_auth_method"));
        }

        let removed = self.oauth_repo.delete(user_id, provider).await?;
        if !removed {
            return Err(ApiError::not_found("no linked account for this provider"));
        }
        Ok(())
    }
}
