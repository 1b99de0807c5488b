use platform_service_core::domains::auth::domain::repository::UserRepository;
use platform_service_core::domains::auth::domain::service::{
    AuthProvider, EmailVerificationService, FederationService, PasswordResetService,
};
use platform_service_core::domains::billing::domain::service::{BillingService, Entitlements};
use platform_service_core::domains::org::domain::service::{InviteService, OrgService};
use platform_service_core::domains::org::domain::repository::MembershipRepository;
use platform_service_core::domains::project::domain::repository::{
    AuditLogRepository, DeploymentRepository, EnvVarRepository, ProjectRepository, SecretCodec,
};
use platform_service_infra::auth::{
    IdpSyncService, OAuthClient, OAuthRegistry, PgRoleRepository, PgUserRepository,
};
use shared_config::Config;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared by every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,

    // Auth pipeline
    pub auth_provider: Arc<dyn AuthProvider>,
    pub verification: Arc<dyn EmailVerificationService>,
    pub password_reset: Arc<dyn PasswordResetService>,
    pub federation: Arc<dyn FederationService>,
    pub oauth_registry: OAuthRegistry,
    pub oauth_client: OAuthClient,
    pub idp_sync: Option<Arc<IdpSyncService<PgUserRepository, PgRoleRepository>>>,

    // Tenancy and entitlements
    pub org_service: Arc<dyn OrgService>,
    pub invite_service: Arc<dyn InviteService>,
    pub membership_repo: Arc<dyn MembershipRepository>,
    pub entitlements: Arc<dyn Entitlements>,
    pub billing: Arc<dyn BillingService>,

    // Domain repositories
    pub user_repo: Arc<dyn UserRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub deployment_repo: Arc<dyn DeploymentRepository>,
    pub env_var_repo: Arc<dyn EnvVarRepository>,
    pub audit_repo: Arc<dyn AuditLogRepository>,
    pub secret_codec: Arc<dyn SecretCodec>,
}

impl AppState {
    /// Secure cookies everywhere outside development
    pub fn secure_cookies(&self) -> bool {
        self.config.is_production()
    }
}
