use async_trait::async_trait;
use chrono::Utc;
use platform_service_core::domains::auth::{
    domain::{
        model::User,
        repository::{RefreshTokenRepository, RoleRepository, UserRepository},
        service::{AuthProvider, EmailVerificationService},
    },
    dto::auth_dto::{AuthResp, LoginReq, RegisterReq, UserInfo},
    utils::password_policy::validate_password,
};
use shared_error::ApiError;
use shared_jwt::AccessClaims;
use std::sync::Arc;
use uuid::Uuid;

use super::token_service::TokenService;

/// Local auth provider: bcrypt credentials plus the token service
pub struct LocalAuthProvider<UR, RoR, RR>
where
    UR: UserRepository,
    RoR: RoleRepository,
    RR: RefreshTokenRepository,
{
    user_repo: UR,
    role_repo: RoR,
    token_service: TokenService<RR>,
    verification: Option<Arc<dyn EmailVerificationService>>,
}

impl<UR, RoR, RR> LocalAuthProvider<UR, RoR, RR>
where
    UR: UserRepository,
    RoR: RoleRepository,
    RR: RefreshTokenRepository,
{
    pub fn new(user_repo: UR, role_repo: RoR, token_service: TokenService<RR>) -> Self {
        Self {
            user_repo,
            role_repo,
            token_service,
            verification: None,
        }
    }

    /// Wire the verification flow so registration sends the email
    pub fn with_verification(mut self, verification: Arc<dyn EmailVerificationService>) -> Self {
        self.verification = Some(verification);
        self
    }

    async fn auth_response(&self, user: &User) -> Result<AuthResp, ApiError> {
        let roles = self.role_repo.roles_for_user(user.user_id).await?;
        let (access_token, refresh_token) =
            self.token_service.issue_pair(user, roles.clone()).await?;

        Ok(AuthResp {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_ttl_secs(),
            user: UserInfo::from_user(user, roles),
        })
    }
}

#[async_trait]
impl<UR, RoR, RR> AuthProvider for LocalAuthProvider<UR, RoR, RR>
where
    UR: UserRepository + Send + Sync,
    RoR: RoleRepository + Send + Sync,
    RR: RefreshTokenRepository + Send + Sync,
{
    async fn register(&self, req: RegisterReq) -> Result<AuthResp, ApiError> {
        validate_password(&req.password)?;

        if self.user_repo.email_exists(&req.email).await? {
            return Err(ApiError::conflict("email already registered"));
        }

        let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)?;

        let now = Utc::now();
        let user = User {
            user_id: Uuid::now_v7(),
            email: req.email.clone(),
            name: req.name.clone(),
            password_hash: Some(password_hash),
            avatar_url: None,
            email_verified: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self.user_repo.create(&user).await?;
        self.role_repo.assign_role(created.user_id, "user").await?;

        // Verification email is best-effort; registration succeeds without it
        if let Some(verification) = &self.verification {
            if let Err(e) = verification
                .send_verification(created.user_id, &created.email)
                .await
            {
                tracing::warn!(
                    user_id = %created.user_id,
                    error = %e,
                    "failed to send verification email"
                );
            }
        }

        self.auth_response(&created).await
    }

    async fn login(&self, req: LoginReq) -> Result<AuthResp, ApiError> {
        // Every failure below is the same answer; account existence is
        // never revealed.
        let user = self
            .user_repo
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid_credentials"))?;

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized("invalid_credentials"))?;

        let valid = bcrypt::verify(&req.password, password_hash)?;
        if !valid {
            return Err(ApiError::unauthorized("invalid_credentials"));
        }

        self.auth_response(&user).await
    }

    async fn validate_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        self.token_service.validate_access_token(token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResp, ApiError> {
        let (user_id, new_refresh) = self.token_service.rotate(refresh_token).await?;

        // Re-read identity and roles so changes take effect on rotation
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid_token"))?;
        let roles = self.role_repo.roles_for_user(user.user_id).await?;

        let access_token = self
            .token_service
            .mint_access_token(&user, roles.clone())?;

        Ok(AuthResp {
            access_token,
            refresh_token: new_refresh,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_ttl_secs(),
            user: UserInfo::from_user(&user, roles),
        })
    }

    async fn logout(&self, user_id: Uuid) -> Result<(), ApiError> {
        let revoked = self.token_service.revoke_all_for_user(user_id).await?;
        tracing::debug!(user_id = %user_id, revoked, "logout revoked refresh tokens");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use platform_service_core::domains::auth::domain::model::RefreshToken;

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
        Roles {}

        #[async_trait]
        impl RoleRepository for Roles {
            async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, ApiError>;
            async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), ApiError>;
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

    fn token_service(repo: MockRefresh) -> TokenService<MockRefresh> {
        TokenService::new(repo, "test_secret".to_string(), 900, 604_800)
    }

    fn existing_user(password: &str) -> User {
        let now = Utc::now();
        User {
            user_id: Uuid::new_v4(),
            email: "ada@x.io".to_string(),
            name: "Ada".to_string(),
            password_hash: Some(bcrypt::hash(password, 4).unwrap()),
            avatar_url: None,
            email_verified: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let provider =
            LocalAuthProvider::new(MockUsers::new(), MockRoles::new(), token_service(MockRefresh::new()));

        let err = provider
            .register(RegisterReq {
                name: "Ada".to_string(),
                email: "ada@x.io".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_conflict_on_taken_email() {
        let mut users = MockUsers::new();
        users.expect_email_exists().returning(|_| Ok(true));

        let provider =
            LocalAuthProvider::new(users, MockRoles::new(), token_service(MockRefresh::new()));

        let err = provider
            .register(RegisterReq {
                name: "Ada".to_string(),
                email: "ada@x.io".to_string(),
                password: "LovelaceBytes#9".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_register_returns_token_pair() {
        let mut users = MockUsers::new();
        users.expect_email_exists().returning(|_| Ok(false));
        users.expect_create().returning(|user| Ok(user.clone()));

        let mut roles = MockRoles::new();
        roles
            .expect_assign_role()
            .withf(|_, role| role == "user")
            .returning(|_, _| Ok(()));
        roles
            .expect_roles_for_user()
            .returning(|_| Ok(vec!["user".to_string()]));

        let mut refresh = MockRefresh::new();
        refresh.expect_create().returning(|row| Ok(row.clone()));

        let provider = LocalAuthProvider::new(users, roles, token_service(refresh));

        let resp = provider
            .register(RegisterReq {
                name: "Ada".to_string(),
                email: "ada@x.io".to_string(),
                password: "LovelaceBytes#9".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(resp.token_type, "Bearer");
        assert!(!resp.access_token.is_empty());
        assert!(!resp.refresh_token.is_empty());
        assert_eq!(resp.user.email, "ada@x.io");
        assert!(!resp.user.email_verified);
    }

    #[tokio::test]
    async fn test_login_unknown_and_wrong_password_are_identical() {
        // Unknown account
        let mut users = MockUsers::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let provider =
            LocalAuthProvider::new(users, MockRoles::new(), token_service(MockRefresh::new()));
        let unknown = provider
            .login(LoginReq {
                email: "ghost@x.io".to_string(),
                password: "whatever12345!A".to_string(),
            })
            .await
            .unwrap_err();

        // Wrong password
        let mut users = MockUsers::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(existing_user("LovelaceBytes#9"))));
        let provider =
            LocalAuthProvider::new(users, MockRoles::new(), token_service(MockRefresh::new()));
        let wrong = provider
            .login(LoginReq {
                email: "ada@x.io".to_string(),
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(unknown.code(), "UNAUTHORIZED");
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.message(), wrong.message());
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut users = MockUsers::new();
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(existing_user("LovelaceBytes#9"))));

        let mut roles = MockRoles::new();
        roles
            .expect_roles_for_user()
            .returning(|_| Ok(vec!["user".to_string()]));

        let mut refresh = MockRefresh::new();
        refresh.expect_create().returning(|row| Ok(row.clone()));

        let provider = LocalAuthProvider::new(users, roles, token_service(refresh));

        let resp = provider
            .login(LoginReq {
                email: "ada@x.io".to_string(),
                password: "LovelaceBytes#9".to_string(),
            })
            .await
            .unwrap();

        let claims = provider.validate_token(&resp.access_token).await.unwrap();
        assert_eq!(claims.email, "ada@x.io");
    }

    #[tokio::test]
    async fn test_federated_only_account_cannot_password_login() {
        let mut users = MockUsers::new();
        users.expect_find_by_email().returning(|_| {
            let mut user = existing_user("irrelevant");
            user.password_hash = None;
            Ok(Some(user))
        });

        let provider =
            LocalAuthProvider::new(users, MockRoles::new(), token_service(MockRefresh::new()));

        let err = provider
            .login(LoginReq {
                email: "ada@x.io".to_string(),
                password: "LovelaceBytes#9".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.message(), "invalid_credentials");
    }
}
