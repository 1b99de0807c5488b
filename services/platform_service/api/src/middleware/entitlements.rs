use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform_service_core::domains::billing::domain::model::QuotaResource;
use shared_auth::OrgContext;
use shared_error::ApiError;

use crate::state::AppState;

/// Quota gate for creating routes
///
/// Runs after tenancy resolution, before the handler. Two concurrent
/// creators can overshoot the cap by one; the check converges on the next
/// request.
pub async fn quota_guard(
    State((state, resource)): State<(AppState, QuotaResource)>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let org = req
        .extensions()
        .get::<OrgContext>()
        .ok_or_else(|| ApiError::forbidden("not a member of this organization"))?;

    state.entitlements.check_quota(org.org_id, resource).await?;
    Ok(next.run(req).await)
}

/// Feature-flag gate
pub async fn feature_guard(
    State((state, feature)): State<(AppState, &'static str)>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let org = req
        .extensions()
        .get::<OrgContext>()
        .ok_or_else(|| ApiError::forbidden("not a member of this organization"))?;

    if !state.entitlements.has_feature(org.org_id, feature).await? {
        return Err(ApiError::upgrade_required(format!(
            "feature_not_available: {} requires a higher plan",
            feature
        )));
    }
    Ok(next.run(req).await)
}
