use async_trait::async_trait;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{PlanLimits, QuotaResource, Usage};
use crate::domains::billing::dto::billing_dto::{BillingOverviewResp, CheckoutReq, CheckoutResp};

/// Plan resolution, quota checks and feature flags
#[async_trait]
pub trait Entitlements: Send + Sync {
    /// The org's active plan limits, or the Free defaults
    async fn resolve_limits(&self, org_id: Uuid) -> Result<PlanLimits, ApiError>;

    /// Fail with `UPGRADE_REQUIRED` when creating one more `resource`
    /// would exceed the plan cap. Evaluated before the creating handler;
    /// an overshoot of one under concurrent creators is accepted.
    async fn check_quota(&self, org_id: Uuid, resource: QuotaResource) -> Result<(), ApiError>;

    async fn has_feature(&self, org_id: Uuid, feature: &str) -> Result<bool, ApiError>;

    async fn usage(&self, org_id: Uuid) -> Result<Usage, ApiError>;
}

/// Billing overview and checkout plus the webhook transition
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn overview(&self, org_id: Uuid) -> Result<BillingOverviewResp, ApiError>;

    /// Create a pending subscription + invoice for a plan change
    async fn checkout(&self, org_id: Uuid, req: CheckoutReq) -> Result<CheckoutResp, ApiError>;

    /// Apply a PAID event from the billing provider. Idempotent: an
    /// already-paid invoice is a no-op, not an error.
    async fn apply_invoice_paid(&self, external_id: &str) -> Result<(), ApiError>;

    /// Apply an EXPIRED/FAILED event from the billing provider
    async fn apply_invoice_failed(&self, external_id: &str, status: &str) -> Result<(), ApiError>;
}
