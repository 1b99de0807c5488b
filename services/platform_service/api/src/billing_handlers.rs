use axum::extract::State;
use axum::Json;
use platform_service_core::domains::billing::dto::billing_dto::{
    BillingOverviewResp, CheckoutReq, CheckoutResp,
};
use shared_auth::{AdminRole, OwnerRole, RequireOrgRole};
use shared_error::{ApiError, ApiResponse};
use uuid::Uuid;
use validator::Validate;

use crate::state::AppState;

/// Plan, caps and usage of the org (admin or higher)
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/billing",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Billing overview", body = BillingOverviewResp))
)]
pub async fn billing_overview(
    State(state): State<AppState>,
    ctx: RequireOrgRole<AdminRole>,
) -> Result<ApiResponse<BillingOverviewResp>, ApiError> {
    let overview = state.billing.overview(ctx.org.org_id).await?;
    Ok(ApiResponse::success(overview))
}

/// Start a plan change (owner only)
///
/// Creates a pending invoice with the billing provider; the paid webhook
/// activates the subscription.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/billing/checkout",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    request_body = CheckoutReq,
    responses(
        (status = 201, description = "Invoice created", body = CheckoutResp),
        (status = 404, description = "Unknown plan"),
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    ctx: RequireOrgRole<OwnerRole>,
    Json(payload): Json<CheckoutReq>,
) -> Result<ApiResponse<CheckoutResp>, ApiError> {
    payload.validate()?;

    let resp = state.billing.checkout(ctx.org.org_id, payload).await?;
    Ok(ApiResponse::created(resp))
}
