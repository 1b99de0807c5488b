use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use platform_service_core::domains::auth::dto::auth_dto::{
    AuthResp, LoginReq, MessageResp, RefreshReq, RegisterReq, UserInfo,
};
use platform_service_core::domains::auth::dto::email_verification_dto::{
    ResendVerificationReq, VerifyEmailReq,
};
use platform_service_core::domains::auth::dto::oauth_dto::OAuthAccountResp;
use platform_service_core::domains::auth::dto::password_reset_dto::{
    ForgotPasswordReq, ResetPasswordReq,
};
use platform_service_core::domains::auth::dto::user_dto::UpdateProfileReq;
use platform_service_core::domains::billing::dto::billing_dto::{
    BillingOverviewResp, CheckoutReq, CheckoutResp, PlanLimitsResp, UsageResp, XenditInvoiceEvent,
};
use platform_service_core::domains::org::dto::org_dto::{
    AcceptInviteResp, CreateInviteReq, CreateOrgReq, InviteResp, MemberResp, OrgResp,
    OrgWithRoleResp, UpdateMemberReq, UpdateOrgReq,
};
use platform_service_core::domains::project::dto::project_dto::{
    AuditLogResp, CreateDeploymentReq, CreateProjectReq, DeploymentResp, EnvVarResp, ProjectResp,
    SetEnvVarReq, UpdateProjectReq,
};

use crate::{
    billing_handlers, deployment_handlers, env_var_handlers, handlers, invite_handlers,
    oauth_handlers, org_handlers, password_reset_handlers, project_handlers, user_handlers,
    verification_handlers, webhook_handlers,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Platform Control Plane API",
        description = "Multi-tenant PaaS control plane: auth, orgs, projects, deployments, billing"
    ),
    paths(
        handlers::healthz,
        handlers::readyz,
        handlers::register,
        handlers::login,
        handlers::refresh,
        handlers::logout,
        verification_handlers::verify_email,
        verification_handlers::resend_verification,
        password_reset_handlers::request_reset,
        password_reset_handlers::reset_password,
        oauth_handlers::oauth_authorize,
        oauth_handlers::oauth_callback,
        oauth_handlers::list_oauth_accounts,
        oauth_handlers::unlink_oauth_account,
        user_handlers::get_me,
        user_handlers::update_me,
        org_handlers::create_org,
        org_handlers::list_orgs,
        org_handlers::get_org,
        org_handlers::update_org,
        org_handlers::delete_org,
        org_handlers::list_members,
        org_handlers::update_member,
        org_handlers::remove_member,
        org_handlers::list_audit_logs,
        invite_handlers::create_invite,
        invite_handlers::list_invites,
        invite_handlers::revoke_invite,
        invite_handlers::accept_invite,
        project_handlers::create_project,
        project_handlers::list_projects,
        project_handlers::get_project,
        project_handlers::update_project,
        project_handlers::delete_project,
        deployment_handlers::create_deployment,
        deployment_handlers::list_deployments,
        deployment_handlers::stop_deployment,
        env_var_handlers::list_env_vars,
        env_var_handlers::put_env_var,
        env_var_handlers::delete_env_var,
        billing_handlers::billing_overview,
        billing_handlers::checkout,
        webhook_handlers::xendit_webhook,
        webhook_handlers::idp_webhook,
    ),
    components(schemas(
        RegisterReq,
        LoginReq,
        RefreshReq,
        AuthResp,
        UserInfo,
        MessageResp,
        VerifyEmailReq,
        ResendVerificationReq,
        ForgotPasswordReq,
        ResetPasswordReq,
        UpdateProfileReq,
        OAuthAccountResp,
        CreateOrgReq,
        UpdateOrgReq,
        OrgResp,
        OrgWithRoleResp,
        MemberResp,
        UpdateMemberReq,
        CreateInviteReq,
        InviteResp,
        AcceptInviteResp,
        CreateProjectReq,
        UpdateProjectReq,
        ProjectResp,
        CreateDeploymentReq,
        DeploymentResp,
        SetEnvVarReq,
        EnvVarResp,
        AuditLogResp,
        BillingOverviewResp,
        PlanLimitsResp,
        UsageResp,
        CheckoutReq,
        CheckoutResp,
        XenditInvoiceEvent,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, token lifecycle"),
        (name = "oauth", description = "OAuth federation"),
        (name = "users", description = "Profile"),
        (name = "orgs", description = "Organizations and membership"),
        (name = "invites", description = "Invitations"),
        (name = "projects", description = "Projects"),
        (name = "deployments", description = "Deployments"),
        (name = "env-vars", description = "Environment variables"),
        (name = "billing", description = "Plans and billing"),
        (name = "webhooks", description = "Signed provider callbacks"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
