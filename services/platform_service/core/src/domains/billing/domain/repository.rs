use async_trait::async_trait;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{BillingPlan, Invoice, Subscription, SubscriptionStatus};

/// Plan catalogue (seeded, read-only at runtime)
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<BillingPlan>, ApiError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BillingPlan>, ApiError>;

    async fn list(&self) -> Result<Vec<BillingPlan>, ApiError>;
}

/// Subscription repository
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Most recent non-terminal subscription, if any
    async fn current_for_org(&self, org_id: Uuid) -> Result<Option<Subscription>, ApiError>;

    async fn create(&self, subscription: &Subscription) -> Result<Subscription, ApiError>;

    async fn set_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, ApiError>;
}

/// Invoice repository
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice, ApiError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Invoice>, ApiError>;

    /// One transaction: mark the invoice paid and activate its
    /// subscription. Already-paid invoices are left untouched (returns
    /// false) so webhook retries stay idempotent.
    async fn mark_paid_and_activate(&self, invoice_id: Uuid) -> Result<bool, ApiError>;
}
