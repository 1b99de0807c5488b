// Library exports for integration tests
pub mod billing_handlers;
pub mod cookie_helper;
pub mod deployment_handlers;
pub mod env_var_handlers;
pub mod handlers;
pub mod invite_handlers;
pub mod middleware;
pub mod oauth_handlers;
pub mod openapi;
pub mod org_handlers;
pub mod password_reset_handlers;
pub mod project_handlers;
pub mod state;
pub mod user_handlers;
pub mod verification_handlers;
pub mod webhook_handlers;

pub use state::AppState;

use axum::http::Response;
use axum::routing::{delete, get, patch, post};
use axum::{middleware as axum_middleware, Router};
use platform_service_core::domains::billing::domain::model::QuotaResource;
use platform_service_core::domains::project::domain::repository::PlaintextCodec;
use platform_service_infra::auth::{
    EmailVerificationServiceImpl, ExternalIdpProvider, FederationServiceImpl, IdpClient,
    IdpConfig, IdpSyncService, LocalAuthProvider, OAuthClient, OAuthRegistry,
    PasswordResetServiceImpl, PgEmailVerificationRepository, PgOAuthAccountRepository,
    PgPasswordResetRepository, PgRefreshTokenRepository, PgRoleRepository, PgUserRepository,
    SmtpConfig, SmtpEmailSender, TokenService,
};
use platform_service_infra::billing::{
    BillingServiceImpl, EntitlementsImpl, PgInvoiceRepository, PgPlanRepository,
    PgSubscriptionRepository,
};
use platform_service_infra::org::{
    InviteServiceImpl, OrgServiceImpl, PgInviteRepository, PgMembershipRepository, PgOrgRepository,
};
use platform_service_infra::project::{
    PgAuditLogRepository, PgDeploymentRepository, PgEnvVarRepository, PgProjectRepository,
};
use shared_config::Config;
use shared_error::ApiError;
use shared_rate_limit::{RateLimitLayer, RateLimitState};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Wire repositories, services and providers into the shared state
pub fn build_state(config: Config, db: PgPool) -> Result<AppState, ApiError> {
    let config = Arc::new(config);

    let user_repo = PgUserRepository::new(db.clone());
    let role_repo = PgRoleRepository::new(db.clone());
    let refresh_repo = PgRefreshTokenRepository::new(db.clone());
    let membership_repo = PgMembershipRepository::new(db.clone());
    let project_repo = PgProjectRepository::new(db.clone());
    let deployment_repo = PgDeploymentRepository::new(db.clone());
    let subscription_repo = PgSubscriptionRepository::new(db.clone());
    let plan_repo = PgPlanRepository::new(db.clone());

    let access_ttl = config.access_token_ttl().as_secs() as i64;
    let refresh_ttl = config.refresh_token_ttl().as_secs() as i64;

    let sender: Arc<dyn platform_service_infra::auth::EmailSender> =
        Arc::new(SmtpEmailSender::new(SmtpConfig {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username: config.smtp_username.clone(),
            password: config.smtp_password.clone(),
            from_email: config.smtp_from_email.clone(),
            from_name: config.smtp_from_name.clone(),
        })?);

    let verification = Arc::new(EmailVerificationServiceImpl::new(
        PgEmailVerificationRepository::new(db.clone()),
        user_repo.clone(),
        sender.clone(),
        config.oauth_frontend_url.clone(),
        config.email_verification_ttl().as_secs() as i64,
    ));

    let password_reset = Arc::new(PasswordResetServiceImpl::new(
        PgPasswordResetRepository::new(db.clone()),
        user_repo.clone(),
        refresh_repo.clone(),
        sender.clone(),
        config.oauth_frontend_url.clone(),
        config.password_reset_ttl().as_secs() as i64,
    ));

    let auth_provider: Arc<dyn platform_service_core::domains::auth::domain::service::AuthProvider> =
        if config.auth_provider == "external" {
            let idp = IdpClient::new(IdpConfig {
                base_url: config.external_idp_url.clone().unwrap_or_default(),
                api_key: config.external_idp_key.clone().unwrap_or_default(),
            })?;
            Arc::new(ExternalIdpProvider::new(
                idp,
                config.external_idp_jwt_secret.clone().unwrap_or_default(),
            ))
        } else {
            Arc::new(
                LocalAuthProvider::new(
                    user_repo.clone(),
                    role_repo.clone(),
                    TokenService::new(
                        refresh_repo.clone(),
                        config.jwt_secret.clone(),
                        access_ttl,
                        refresh_ttl,
                    ),
                )
                .with_verification(verification.clone()),
            )
        };

    let federation = Arc::new(FederationServiceImpl::new(
        user_repo.clone(),
        role_repo.clone(),
        PgOAuthAccountRepository::new(db.clone()),
        TokenService::new(
            refresh_repo.clone(),
            config.jwt_secret.clone(),
            access_ttl,
            refresh_ttl,
        ),
    ));

    let org_service = Arc::new(OrgServiceImpl::new(
        PgOrgRepository::new(db.clone()),
        membership_repo.clone(),
    ));

    let invite_service = Arc::new(InviteServiceImpl::new(
        PgInviteRepository::new(db.clone()),
        membership_repo.clone(),
        user_repo.clone(),
        sender.clone(),
        config.oauth_frontend_url.clone(),
    ));

    let entitlements = Arc::new(EntitlementsImpl::new(
        subscription_repo.clone(),
        plan_repo.clone(),
        project_repo.clone(),
        deployment_repo.clone(),
        membership_repo.clone(),
    ));

    let billing = Arc::new(BillingServiceImpl::new(
        subscription_repo.clone(),
        plan_repo.clone(),
        PgInvoiceRepository::new(db.clone()),
        EntitlementsImpl::new(
            subscription_repo,
            plan_repo,
            project_repo.clone(),
            deployment_repo.clone(),
            membership_repo.clone(),
        ),
    ));

    let oauth_registry = OAuthRegistry::from_config(&config);

    Ok(AppState {
        config,
        db: db.clone(),
        auth_provider,
        verification,
        password_reset,
        federation,
        oauth_registry,
        oauth_client: OAuthClient::new()?,
        idp_sync: Some(Arc::new(IdpSyncService::new(user_repo.clone(), role_repo))),
        org_service,
        invite_service,
        membership_repo: Arc::new(membership_repo),
        entitlements,
        billing,
        user_repo: Arc::new(user_repo),
        project_repo: Arc::new(project_repo),
        deployment_repo: Arc::new(deployment_repo),
        env_var_repo: Arc::new(PgEnvVarRepository::new(db.clone())),
        audit_repo: Arc::new(PgAuditLogRepository::new(db)),
        secret_codec: Arc::new(PlaintextCodec),
    })
}

/// Assemble the middleware chain and the route tree
///
/// Layer order, outermost first: recovery, request id, logger, envelope
/// formatter, security headers, CORS, then per-group CSRF / rate limiting /
/// auth / tenancy / entitlements.
pub fn build_router(state: AppState) -> Router {
    let rate_limit = RateLimitState::new(
        state.config.ratelimit_requests,
        state.config.ratelimit_window(),
        state.config.ratelimit_enabled,
    );

    // Public auth endpoints, rate-limited per client IP
    let public_auth = Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route(
            "/api/v1/auth/verify-email",
            post(verification_handlers::verify_email),
        )
        .route(
            "/api/v1/auth/resend-verification",
            post(verification_handlers::resend_verification),
        )
        .route(
            "/api/v1/auth/request-reset",
            post(password_reset_handlers::request_reset),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(password_reset_handlers::reset_password),
        )
        .layer(RateLimitLayer::new(rate_limit, "rate_limit:auth:ip"));

    // OAuth redirects (safe methods, no rate limit)
    let oauth = Router::new()
        .route(
            "/api/v1/auth/oauth/{provider}",
            get(oauth_handlers::oauth_authorize),
        )
        .route(
            "/api/v1/auth/oauth/{provider}/callback",
            get(oauth_handlers::oauth_callback),
        );

    // Quota-gated creators and the feature-gated audit trail
    let gated = Router::new()
        .merge(
            Router::new()
                .route(
                    "/api/v1/orgs/{org_id}/projects",
                    post(project_handlers::create_project),
                )
                .route_layer(axum_middleware::from_fn_with_state(
                    (state.clone(), QuotaResource::Projects),
                    middleware::entitlements::quota_guard,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/orgs/{org_id}/projects/{project_id}/deployments",
                    post(deployment_handlers::create_deployment),
                )
                .route_layer(axum_middleware::from_fn_with_state(
                    (state.clone(), QuotaResource::Deployments),
                    middleware::entitlements::quota_guard,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/orgs/{org_id}/invites",
                    post(invite_handlers::create_invite),
                )
                .route_layer(axum_middleware::from_fn_with_state(
                    (state.clone(), QuotaResource::Members),
                    middleware::entitlements::quota_guard,
                )),
        )
        .merge(
            Router::new()
                .route(
                    "/api/v1/orgs/{org_id}/audit-logs",
                    get(org_handlers::list_audit_logs),
                )
                .route_layer(axum_middleware::from_fn_with_state(
                    (state.clone(), "audit_logs"),
                    middleware::entitlements::feature_guard,
                )),
        );

    // Tenant-scoped tree: membership resolved once per request
    let org_scoped = Router::new()
        .route(
            "/api/v1/orgs/{org_id}",
            get(org_handlers::get_org)
                .patch(org_handlers::update_org)
                .delete(org_handlers::delete_org),
        )
        .route(
            "/api/v1/orgs/{org_id}/members",
            get(org_handlers::list_members),
        )
        .route(
            "/api/v1/orgs/{org_id}/members/{user_id}",
            patch(org_handlers::update_member).delete(org_handlers::remove_member),
        )
        .route(
            "/api/v1/orgs/{org_id}/invites",
            get(invite_handlers::list_invites),
        )
        .route(
            "/api/v1/orgs/{org_id}/invites/{invite_id}",
            delete(invite_handlers::revoke_invite),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects",
            get(project_handlers::list_projects),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects/{project_id}",
            get(project_handlers::get_project)
                .patch(project_handlers::update_project)
                .delete(project_handlers::delete_project),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects/{project_id}/deployments",
            get(deployment_handlers::list_deployments),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects/{project_id}/deployments/{deployment_id}/stop",
            post(deployment_handlers::stop_deployment),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects/{project_id}/env-vars",
            get(env_var_handlers::list_env_vars).put(env_var_handlers::put_env_var),
        )
        .route(
            "/api/v1/orgs/{org_id}/projects/{project_id}/env-vars/{key}",
            delete(env_var_handlers::delete_env_var),
        )
        .route(
            "/api/v1/orgs/{org_id}/billing",
            get(billing_handlers::billing_overview),
        )
        .route(
            "/api/v1/orgs/{org_id}/billing/checkout",
            post(billing_handlers::checkout),
        )
        .merge(gated)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::org::org_resolver,
        ));

    // Token-protected, non-tenant routes
    let me = Router::new()
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route(
            "/api/v1/users/me",
            get(user_handlers::get_me).put(user_handlers::update_me),
        )
        .route(
            "/api/v1/users/me/oauth-accounts",
            get(oauth_handlers::list_oauth_accounts),
        )
        .route(
            "/api/v1/users/me/oauth-accounts/{provider}",
            delete(oauth_handlers::unlink_oauth_account),
        )
        .route(
            "/api/v1/orgs",
            post(org_handlers::create_org).get(org_handlers::list_orgs),
        )
        .route(
            "/api/v1/invites/{token}/accept",
            post(invite_handlers::accept_invite),
        );

    let protected = me.merge(org_scoped).route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::auth::jwt_auth),
    );

    // CSRF covers the browser-facing surface; webhooks authenticate by
    // signature instead and stay outside it.
    let api = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(public_auth)
        .merge(oauth)
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::csrf::csrf,
        ));

    let webhooks = Router::new()
        .route(
            "/api/v1/webhooks/xendit",
            post(webhook_handlers::xendit_webhook),
        )
        .route(
            "/api/v1/webhooks/idp/auth",
            post(webhook_handlers::idp_webhook),
        );

    Router::new()
        .merge(api)
        .merge(webhooks)
        .with_state(state.clone())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::cors::cors,
        ))
        .layer(axum_middleware::from_fn(
            middleware::security_headers::security_headers,
        ))
        .layer(axum_middleware::from_fn(
            middleware::error_envelope::error_envelope,
        ))
        .layer(axum_middleware::from_fn(middleware::logger::logger))
        .layer(axum_middleware::from_fn(middleware::request_id::request_id))
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Recovery: uncaught panics become a structured 500
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response<axum::body::Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(|s| s.as_str())
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("panic");
    tracing::error!(panic = %detail, "request handler panicked");

    axum::response::IntoResponse::into_response(ApiError::internal("request handler panicked"))
}
