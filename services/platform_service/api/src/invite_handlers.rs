use axum::extract::{Path, State};
use axum::Json;
use platform_service_core::domains::org::dto::org_dto::{
    AcceptInviteResp, CreateInviteReq, InviteResp,
};
use serde_json::json;
use shared_auth::{AdminRole, AuthUser, RequireOrgRole};
use shared_error::{ApiError, ApiResponse};
use uuid::Uuid;
use validator::Validate;

use crate::org_handlers::audit;
use crate::state::AppState;

/// Invite someone by email (admin or higher; counts against the member
/// quota)
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/invites",
    tag = "invites",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    request_body = CreateInviteReq,
    responses(
        (status = 201, description = "Invite created", body = InviteResp),
        (status = 402, description = "Member quota reached"),
        (status = 409, description = "Already a member or already invited"),
    )
)]
pub async fn create_invite(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<AdminRole>,
    Json(payload): Json<CreateInviteReq>,
) -> Result<ApiResponse<InviteResp>, ApiError> {
    payload.validate()?;

    let (invite, _raw) = state
        .invite_service
        .create_invite(ctx.org.org_id, user.user_id, payload)
        .await?;

    audit(
        &state,
        ctx.org.org_id,
        Some(user.user_id),
        "invite.created",
        "invite",
        Some(invite.invite_id.to_string()),
    )
    .await;
    Ok(ApiResponse::created(InviteResp::from(&invite)))
}

/// Pending invites of the org (admin or higher)
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/invites",
    tag = "invites",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Pending invites", body = [InviteResp]))
)]
pub async fn list_invites(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
) -> Result<ApiResponse<Vec<InviteResp>>, ApiError> {
    let invites = state.invite_service.list_invites(ctx.org.org_id).await?;
    Ok(ApiResponse::success(
        invites.iter().map(InviteResp::from).collect(),
    ))
}

/// Revoke a pending invite (admin or higher)
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/invites/{invite_id}",
    tag = "invites",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("invite_id" = Uuid, Path, description = "Invite id"),
    ),
    responses((status = 200, description = "Invite revoked"))
)]
pub async fn revoke_invite(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
    Path((_org_id, invite_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state
        .invite_service
        .revoke_invite(ctx.org.org_id, invite_id)
        .await?;
    Ok(ApiResponse::success(json!({ "revoked": true })))
}

/// Accept an invite by raw token
///
/// The caller must be authenticated with the email the invite was issued
/// to.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{token}/accept",
    tag = "invites",
    security(("bearer_auth" = [])),
    params(("token" = String, Path, description = "Raw invite token from the email link")),
    responses(
        (status = 200, description = "Joined the org", body = AcceptInviteResp),
        (status = 400, description = "Invalid or expired invite"),
        (status = 403, description = "Invite was issued to a different email"),
    )
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> Result<ApiResponse<AcceptInviteResp>, ApiError> {
    let membership = state
        .invite_service
        .accept_invite(&token, user.user_id, &user.email)
        .await?;

    audit(
        &state,
        membership.org_id,
        Some(user.user_id),
        "invite.accepted",
        "membership",
        Some(membership.membership_id.to_string()),
    )
    .await;
    Ok(ApiResponse::success(AcceptInviteResp {
        org_id: membership.org_id,
        role: membership.role,
    }))
}
