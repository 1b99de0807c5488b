use axum::extract::{Path, Query, State};
use axum::Json;
use platform_service_core::domains::org::dto::org_dto::{
    CreateOrgReq, MemberResp, OrgResp, OrgWithRoleResp, UpdateMemberReq, UpdateOrgReq,
};
use platform_service_core::domains::project::domain::model::AuditLog;
use platform_service_core::domains::project::dto::project_dto::AuditLogResp;
use serde::Deserialize;
use serde_json::json;
use shared_auth::{AdminRole, AuthUser, OrgContext, OwnerRole, RequireOrgRole};
use shared_error::{ApiError, ApiResponse, PageMeta};
use uuid::Uuid;
use validator::Validate;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn normalize(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }
}

/// Create an org; the caller becomes its owner
#[utoipa::path(
    post,
    path = "/api/v1/orgs",
    tag = "orgs",
    security(("bearer_auth" = [])),
    request_body = CreateOrgReq,
    responses(
        (status = 201, description = "Org created", body = OrgResp),
        (status = 409, description = "Slug already taken"),
    )
)]
pub async fn create_org(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrgReq>,
) -> Result<ApiResponse<OrgResp>, ApiError> {
    payload.validate()?;

    let org = state.org_service.create_org(user.user_id, payload).await?;

    audit(&state, org.org_id, Some(user.user_id), "org.created", "org", None).await;
    Ok(ApiResponse::created(OrgResp::from(&org)))
}

/// Orgs the caller belongs to
#[utoipa::path(
    get,
    path = "/api/v1/orgs",
    tag = "orgs",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Orgs with the caller's role", body = [OrgWithRoleResp]))
)]
pub async fn list_orgs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<OrgWithRoleResp>>, ApiError> {
    let orgs = state.org_service.list_orgs_for_user(user.user_id).await?;
    Ok(ApiResponse::success(
        orgs.iter().map(OrgWithRoleResp::from).collect(),
    ))
}

/// Org details
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Org", body = OrgResp))
)]
pub async fn get_org(
    State(state): State<AppState>,
    org: OrgContext,
) -> Result<ApiResponse<OrgResp>, ApiError> {
    let org = state.org_service.get_org(org.org_id).await?;
    Ok(ApiResponse::success(OrgResp::from(&org)))
}

/// Rename an org (admin or higher)
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    request_body = UpdateOrgReq,
    responses((status = 200, description = "Updated org", body = OrgResp))
)]
pub async fn update_org(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
    Json(payload): Json<UpdateOrgReq>,
) -> Result<ApiResponse<OrgResp>, ApiError> {
    payload.validate()?;

    let org = state.org_service.update_org(ctx.org.org_id, payload).await?;
    Ok(ApiResponse::success(OrgResp::from(&org)))
}

/// Soft-delete an org (owner only)
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Org deleted"))
)]
pub async fn delete_org(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<OwnerRole>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state.org_service.delete_org(ctx.org.org_id).await?;

    audit(&state, ctx.org.org_id, Some(user.user_id), "org.deleted", "org", None).await;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}

/// Org members
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/members",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Members", body = [MemberResp]))
)]
pub async fn list_members(
    State(state): State<AppState>,
    org: OrgContext,
) -> Result<ApiResponse<Vec<MemberResp>>, ApiError> {
    let members = state.org_service.list_members(org.org_id).await?;
    Ok(ApiResponse::success(
        members.iter().map(MemberResp::from).collect(),
    ))
}

/// Change a member's role (admin or higher)
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}/members/{user_id}",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("user_id" = Uuid, Path, description = "Member's user id"),
    ),
    request_body = UpdateMemberReq,
    responses(
        (status = 200, description = "Updated membership"),
        (status = 409, description = "Would leave the org without an owner"),
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
    Path((_org_id, target_user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberReq>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    // Granting owner is reserved to owners
    if payload.role == shared_auth::OrgRole::Owner
        && !ctx.org.role.has_permission(shared_auth::OrgRole::Owner)
    {
        return Err(ApiError::forbidden("only owners can grant the owner role"));
    }

    let membership = state
        .org_service
        .update_member_role(ctx.org.org_id, target_user_id, payload.role)
        .await?;

    Ok(ApiResponse::success(json!({
        "user_id": membership.user_id,
        "role": membership.role,
    })))
}

/// Remove a member (admin or higher; the last owner stays)
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/members/{user_id}",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("user_id" = Uuid, Path, description = "Member's user id"),
    ),
    responses(
        (status = 200, description = "Member removed"),
        (status = 409, description = "Would leave the org without an owner"),
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<AdminRole>,
    Path((_org_id, target_user_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state
        .org_service
        .remove_member(ctx.org.org_id, target_user_id)
        .await?;

    audit(
        &state,
        ctx.org.org_id,
        Some(user.user_id),
        "member.removed",
        "membership",
        Some(target_user_id.to_string()),
    )
    .await;
    Ok(ApiResponse::success(json!({ "removed": true })))
}

/// Org audit trail (admin or higher; plan-gated)
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/audit-logs",
    tag = "orgs",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses(
        (status = 200, description = "Audit entries", body = [AuditLogResp]),
        (status = 402, description = "Plan lacks the audit_logs feature"),
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<AuditLogResp>>, ApiError> {
    let (page, per_page) = query.normalize();
    let (entries, total) = state
        .audit_repo
        .list_for_org(ctx.org.org_id, page, per_page)
        .await?;

    Ok(ApiResponse::with_meta(
        entries.iter().map(AuditLogResp::from).collect(),
        PageMeta::new(page, per_page, total),
    ))
}

/// Record an audit entry; failures are logged and swallowed
pub(crate) async fn audit(
    state: &AppState,
    org_id: Uuid,
    user_id: Option<Uuid>,
    action: &str,
    resource_type: &str,
    resource_id: Option<String>,
) {
    let entry = AuditLog::new(org_id, user_id, action, resource_type, resource_id, json!({}));
    if let Err(e) = state.audit_repo.record(&entry).await {
        tracing::warn!(org_id = %org_id, action = %action, error = %e, "audit write failed");
    }
}
