//! Test doubles and router construction for API tests
//!
//! Everything runs without a database: repositories and services are stubs
//! with just enough behavior to drive the middleware chain, and the pool is
//! lazy so it never actually connects.

use async_trait::async_trait;
use chrono::Utc;
use platform_service_api::{build_router, AppState};
use platform_service_core::domains::auth::domain::model::{OAuthAccount, User};
use platform_service_core::domains::auth::domain::repository::UserRepository;
use platform_service_core::domains::auth::domain::service::{
    AuthProvider, EmailVerificationService, FederationService, PasswordResetService,
};
use platform_service_core::domains::auth::dto::auth_dto::{AuthResp, LoginReq, RegisterReq};
use platform_service_core::domains::auth::dto::oauth_dto::FederatedProfile;
use platform_service_core::domains::billing::domain::model::{
    PlanLimits, QuotaResource, Usage,
};
use platform_service_core::domains::billing::domain::service::{BillingService, Entitlements};
use platform_service_core::domains::billing::dto::billing_dto::{
    BillingOverviewResp, CheckoutReq, CheckoutResp, PlanLimitsResp, UsageResp,
};
use platform_service_core::domains::org::domain::model::{
    Invite, MemberRecord, Membership, Org, OrgWithRole,
};
use platform_service_core::domains::org::domain::repository::MembershipRepository;
use platform_service_core::domains::org::domain::service::{InviteService, OrgService};
use platform_service_core::domains::org::dto::org_dto::{
    CreateInviteReq, CreateOrgReq, UpdateOrgReq,
};
use platform_service_core::domains::project::domain::model::{
    AuditLog, Deployment, DeploymentStatus, EnvVar, Project,
};
use platform_service_core::domains::project::domain::repository::{
    AuditLogRepository, DeploymentRepository, EnvVarRepository, PlaintextCodec, ProjectRepository,
};
use platform_service_infra::auth::{OAuthClient, OAuthRegistry};
use shared_auth::OrgRole;
use shared_config::Config;
use shared_error::ApiError;
use shared_jwt::AccessClaims;
use std::sync::Arc;
use uuid::Uuid;

pub const VALID_TOKEN: &str = "valid-token";

pub fn test_user_id() -> Uuid {
    Uuid::parse_str("7e57d004-2b97-44e7-8f6c-f25cf8b8d1a9").unwrap()
}

pub fn test_org_id() -> Uuid {
    Uuid::parse_str("018f4aa2-0000-7000-8000-000000000001").unwrap()
}

fn test_claims() -> AccessClaims {
    AccessClaims::new(
        test_user_id(),
        "ada@x.io".to_string(),
        "Ada".to_string(),
        vec!["user".to_string()],
        900,
    )
}

fn unauthorized() -> ApiError {
    ApiError::unauthorized("invalid_credentials")
}

/// Auth provider that accepts exactly `VALID_TOKEN`
pub struct StubAuthProvider;

#[async_trait]
impl AuthProvider for StubAuthProvider {
    async fn register(&self, _req: RegisterReq) -> Result<AuthResp, ApiError> {
        Err(ApiError::conflict("email already registered"))
    }

    async fn login(&self, _req: LoginReq) -> Result<AuthResp, ApiError> {
        Err(unauthorized())
    }

    async fn validate_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        if token == VALID_TOKEN {
            Ok(test_claims())
        } else {
            Err(ApiError::unauthorized("invalid_token"))
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<AuthResp, ApiError> {
        Err(ApiError::unauthorized("invalid_token"))
    }

    async fn logout(&self, _user_id: Uuid) -> Result<(), ApiError> {
        Ok(())
    }
}

pub struct StubVerification;

#[async_trait]
impl EmailVerificationService for StubVerification {
    async fn send_verification(&self, _user_id: Uuid, _email: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn verify_email(&self, _raw_token: &str) -> Result<(), ApiError> {
        Err(ApiError::bad_request("invalid_or_expired"))
    }

    async fn resend(&self, _email: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

pub struct StubPasswordReset;

#[async_trait]
impl PasswordResetService for StubPasswordReset {
    async fn request_reset(&self, _email: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn reset_password(&self, _raw_token: &str, _new_password: &str) -> Result<(), ApiError> {
        Err(ApiError::bad_request("invalid_or_expired"))
    }
}

pub struct StubFederation;

#[async_trait]
impl FederationService for StubFederation {
    async fn federated_sign_in(&self, _profile: FederatedProfile) -> Result<AuthResp, ApiError> {
        Err(ApiError::internal("not wired in tests"))
    }

    async fn list_accounts(&self, _user_id: Uuid) -> Result<Vec<OAuthAccount>, ApiError> {
        Ok(Vec::new())
    }

    async fn unlink(&self, _user_id: Uuid, _provider: &str) -> Result<(), ApiError> {
        Err(ApiError::bad_request("last_auth_method"))
    }
}

/// Membership lookup configurable per test
pub struct StubMembership {
    pub role: Option<OrgRole>,
}

#[async_trait]
impl MembershipRepository for StubMembership {
    async fn find(&self, org_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, ApiError> {
        let now = Utc::now();
        Ok(self.role.map(|role| Membership {
            membership_id: Uuid::now_v7(),
            org_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn create(&self, membership: &Membership) -> Result<Membership, ApiError> {
        Ok(membership.clone())
    }

    async fn list_for_org(&self, _org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_orgs_for_user(&self, _user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError> {
        Ok(Vec::new())
    }

    async fn count_for_org(&self, _org_id: Uuid) -> Result<i64, ApiError> {
        Ok(1)
    }

    async fn count_owners(&self, _org_id: Uuid) -> Result<i64, ApiError> {
        Ok(1)
    }

    async fn update_role(
        &self,
        _org_id: Uuid,
        _user_id: Uuid,
        _role: OrgRole,
    ) -> Result<Option<Membership>, ApiError> {
        Ok(None)
    }

    async fn remove(&self, _org_id: Uuid, _user_id: Uuid) -> Result<bool, ApiError> {
        Ok(false)
    }
}

/// Entitlements with a switchable project quota
pub struct StubEntitlements {
    pub allow_quota: bool,
}

#[async_trait]
impl Entitlements for StubEntitlements {
    async fn resolve_limits(&self, _org_id: Uuid) -> Result<PlanLimits, ApiError> {
        Ok(PlanLimits::free())
    }

    async fn check_quota(&self, _org_id: Uuid, resource: QuotaResource) -> Result<(), ApiError> {
        if self.allow_quota {
            Ok(())
        } else {
            Err(ApiError::upgrade_required(format!(
                "Free plan allows 1 {}; upgrade to create more",
                resource.as_str()
            )))
        }
    }

    async fn has_feature(&self, _org_id: Uuid, _feature: &str) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn usage(&self, _org_id: Uuid) -> Result<Usage, ApiError> {
        Ok(Usage {
            projects: 0,
            deployments: 0,
            members: 1,
        })
    }
}

pub struct StubBilling;

#[async_trait]
impl BillingService for StubBilling {
    async fn overview(&self, _org_id: Uuid) -> Result<BillingOverviewResp, ApiError> {
        let limits = PlanLimits::free();
        Ok(BillingOverviewResp {
            plan: limits.plan_name.clone(),
            limits: PlanLimitsResp::from(&limits),
            usage: UsageResp::from(Usage {
                projects: 0,
                deployments: 0,
                members: 1,
            }),
            period_end: None,
        })
    }

    async fn checkout(&self, _org_id: Uuid, _req: CheckoutReq) -> Result<CheckoutResp, ApiError> {
        Err(ApiError::not_found("unknown plan"))
    }

    async fn apply_invoice_paid(&self, external_id: &str) -> Result<(), ApiError> {
        if external_id == "inv_known" {
            Ok(())
        } else {
            Err(ApiError::not_found("unknown invoice"))
        }
    }

    async fn apply_invoice_failed(&self, _external_id: &str, _status: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

pub struct StubOrgService;

#[async_trait]
impl OrgService for StubOrgService {
    async fn create_org(&self, _owner_id: Uuid, req: CreateOrgReq) -> Result<Org, ApiError> {
        let now = Utc::now();
        Ok(Org {
            org_id: test_org_id(),
            name: req.name.clone(),
            slug: req.name.to_lowercase().replace(' ', "-"),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    async fn list_orgs_for_user(&self, _user_id: Uuid) -> Result<Vec<OrgWithRole>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_org(&self, org_id: Uuid) -> Result<Org, ApiError> {
        let now = Utc::now();
        Ok(Org {
            org_id,
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    async fn update_org(&self, _org_id: Uuid, _req: UpdateOrgReq) -> Result<Org, ApiError> {
        Err(ApiError::internal("not wired in tests"))
    }

    async fn delete_org(&self, _org_id: Uuid) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_members(&self, _org_id: Uuid) -> Result<Vec<MemberRecord>, ApiError> {
        Ok(Vec::new())
    }

    async fn update_member_role(
        &self,
        _org_id: Uuid,
        _target_user_id: Uuid,
        _role: OrgRole,
    ) -> Result<Membership, ApiError> {
        Err(ApiError::not_found("membership not found"))
    }

    async fn remove_member(&self, _org_id: Uuid, _target_user_id: Uuid) -> Result<(), ApiError> {
        Err(ApiError::conflict("cannot remove the last owner"))
    }
}

pub struct StubInvites;

#[async_trait]
impl InviteService for StubInvites {
    async fn create_invite(
        &self,
        _org_id: Uuid,
        _invited_by: Uuid,
        _req: CreateInviteReq,
    ) -> Result<(Invite, String), ApiError> {
        Err(ApiError::conflict("an invite for this email is pending"))
    }

    async fn list_invites(&self, _org_id: Uuid) -> Result<Vec<Invite>, ApiError> {
        Ok(Vec::new())
    }

    async fn revoke_invite(&self, _org_id: Uuid, _invite_id: Uuid) -> Result<(), ApiError> {
        Ok(())
    }

    async fn accept_invite(
        &self,
        _raw_token: &str,
        _user_id: Uuid,
        _user_email: &str,
    ) -> Result<Membership, ApiError> {
        Err(ApiError::bad_request("invalid_or_expired"))
    }
}

pub struct StubUsers;

#[async_trait]
impl UserRepository for StubUsers {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, ApiError> {
        Ok(None)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let now = Utc::now();
        Ok(Some(User {
            user_id: id,
            email: "ada@x.io".to_string(),
            name: "Ada".to_string(),
            password_hash: Some("x".repeat(60)),
            avatar_url: None,
            email_verified: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }))
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn create(&self, user: &User) -> Result<User, ApiError> {
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, ApiError> {
        Ok(user.clone())
    }

    async fn soft_delete(&self, _id: Uuid) -> Result<bool, ApiError> {
        Ok(true)
    }
}

pub struct StubProjects;

#[async_trait]
impl ProjectRepository for StubProjects {
    async fn create(&self, project: &Project) -> Result<Project, ApiError> {
        Ok(project.clone())
    }

    async fn find(&self, org_id: Uuid, project_id: Uuid) -> Result<Option<Project>, ApiError> {
        let now = Utc::now();
        Ok(Some(Project {
            project_id,
            org_id,
            name: "web-app".to_string(),
            slug: "web-app".to_string(),
            description: None,
            created_by: test_user_id(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }))
    }

    async fn list_for_org(
        &self,
        _org_id: Uuid,
        _page: i64,
        _per_page: i64,
    ) -> Result<(Vec<Project>, i64), ApiError> {
        Ok((Vec::new(), 0))
    }

    async fn update(&self, project: &Project) -> Result<Project, ApiError> {
        Ok(project.clone())
    }

    async fn soft_delete(&self, _org_id: Uuid, _project_id: Uuid) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn count_for_org(&self, _org_id: Uuid) -> Result<i64, ApiError> {
        Ok(0)
    }

    async fn slug_exists(&self, _org_id: Uuid, _slug: &str) -> Result<bool, ApiError> {
        Ok(false)
    }
}

pub struct StubDeployments;

#[async_trait]
impl DeploymentRepository for StubDeployments {
    async fn create(&self, deployment: &Deployment) -> Result<Deployment, ApiError> {
        Ok(deployment.clone())
    }

    async fn find(
        &self,
        _project_id: Uuid,
        _deployment_id: Uuid,
    ) -> Result<Option<Deployment>, ApiError> {
        Ok(None)
    }

    async fn list_for_project(&self, _project_id: Uuid) -> Result<Vec<Deployment>, ApiError> {
        Ok(Vec::new())
    }

    async fn set_status(
        &self,
        _deployment_id: Uuid,
        _status: DeploymentStatus,
    ) -> Result<Option<Deployment>, ApiError> {
        Ok(None)
    }

    async fn count_running_for_org(&self, _org_id: Uuid) -> Result<i64, ApiError> {
        Ok(0)
    }
}

pub struct StubEnvVars;

#[async_trait]
impl EnvVarRepository for StubEnvVars {
    async fn upsert(&self, project_id: Uuid, key: &str, value: &str) -> Result<EnvVar, ApiError> {
        let now = Utc::now();
        Ok(EnvVar {
            env_var_id: Uuid::now_v7(),
            project_id,
            key: key.to_string(),
            value: value.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn list_for_project(&self, _project_id: Uuid) -> Result<Vec<EnvVar>, ApiError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _project_id: Uuid, _key: &str) -> Result<bool, ApiError> {
        Ok(true)
    }
}

pub struct StubAudit;

#[async_trait]
impl AuditLogRepository for StubAudit {
    async fn record(&self, _entry: &AuditLog) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_for_org(
        &self,
        _org_id: Uuid,
        _page: i64,
        _per_page: i64,
    ) -> Result<(Vec<AuditLog>, i64), ApiError> {
        Ok((Vec::new(), 0))
    }
}

fn test_config() -> Config {
    serde_json::from_value(serde_json::json!({
        "database_url": "postgres://postgres@localhost/unused",
        "jwt_secret": "test-secret",
        "ratelimit_requests": 5,
        "ratelimit_window": "15m",
        "xendit_callback_token": "xnd-callback-token",
    }))
    .unwrap()
}

/// Build the full router over stubbed services
pub fn test_app(membership_role: Option<OrgRole>, allow_quota: bool) -> axum::Router {
    let config = test_config();
    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    let state = AppState {
        config: Arc::new(config),
        db,
        auth_provider: Arc::new(StubAuthProvider),
        verification: Arc::new(StubVerification),
        password_reset: Arc::new(StubPasswordReset),
        federation: Arc::new(StubFederation),
        oauth_registry: OAuthRegistry::default(),
        oauth_client: OAuthClient::new().unwrap(),
        idp_sync: None,
        org_service: Arc::new(StubOrgService),
        invite_service: Arc::new(StubInvites),
        membership_repo: Arc::new(StubMembership {
            role: membership_role,
        }),
        entitlements: Arc::new(StubEntitlements { allow_quota }),
        billing: Arc::new(StubBilling),
        user_repo: Arc::new(StubUsers),
        project_repo: Arc::new(StubProjects),
        deployment_repo: Arc::new(StubDeployments),
        env_var_repo: Arc::new(StubEnvVars),
        audit_repo: Arc::new(StubAudit),
        secret_codec: Arc::new(PlaintextCodec),
    };

    build_router(state)
}
