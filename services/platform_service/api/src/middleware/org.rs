use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use shared_auth::{AuthUser, OrgContext};
use shared_error::ApiError;
use std::collections::HashMap;
use uuid::Uuid;

use crate::state::AppState;

/// Tenancy resolution for `/orgs/{org_id}/...` routes
///
/// One membership SELECT per request. Anything short of an exact hit is a
/// uniform 403: an outsider learns nothing about whether the org exists.
pub async fn org_resolver(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let org_id = params
        .get("org_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| ApiError::forbidden("not a member of this organization"))?;

    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("authentication_required"))?;

    let membership = state
        .membership_repo
        .find(org_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("not a member of this organization"))?;

    req.extensions_mut().insert(OrgContext {
        org_id,
        membership_id: membership.membership_id,
        role: membership.role,
    });

    Ok(next.run(req).await)
}
