use async_trait::async_trait;
use chrono::{Duration, Utc};
use platform_service_core::domains::billing::domain::{
    model::{BillingCycle, BillingPlan, Invoice, Subscription, SubscriptionStatus},
    repository::{InvoiceRepository, PlanRepository, SubscriptionRepository},
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of PlanRepository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<BillingPlan>, ApiError> {
        let plan = sqlx::query_as::<_, BillingPlan>("SELECT * FROM billing_plans WHERE plan_id = $1")
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BillingPlan>, ApiError> {
        let plan = sqlx::query_as::<_, BillingPlan>("SELECT * FROM billing_plans WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(plan)
    }

    async fn list(&self) -> Result<Vec<BillingPlan>, ApiError> {
        let plans =
            sqlx::query_as::<_, BillingPlan>("SELECT * FROM billing_plans ORDER BY price_monthly")
                .fetch_all(&self.pool)
                .await?;

        Ok(plans)
    }
}

/// PostgreSQL implementation of SubscriptionRepository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn current_for_org(&self, org_id: Uuid) -> Result<Option<Subscription>, ApiError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT * FROM subscriptions
            WHERE org_id = $1 AND status NOT IN ('cancelled', 'expired')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn create(&self, subscription: &Subscription) -> Result<Subscription, ApiError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (
                subscription_id, org_id, plan_id, status, cycle,
                current_period_start, current_period_end, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(subscription.subscription_id)
        .bind(subscription.org_id)
        .bind(subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.cycle)
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn set_status(
        &self,
        subscription_id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<Option<Subscription>, ApiError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = $2, updated_at = NOW()
            WHERE subscription_id = $1
            RETURNING *
            "#,
        )
        .bind(subscription_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }
}

/// PostgreSQL implementation of InvoiceRepository
#[derive(Clone)]
pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<Invoice, ApiError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, org_id, subscription_id, plan_id, cycle, external_id,
                amount, status, paid_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.org_id)
        .bind(invoice.subscription_id)
        .bind(invoice.plan_id)
        .bind(invoice.cycle)
        .bind(&invoice.external_id)
        .bind(invoice.amount)
        .bind(invoice.status)
        .bind(invoice.paid_at)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Invoice>, ApiError> {
        let invoice =
            sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(invoice)
    }

    async fn mark_paid_and_activate(&self, invoice_id: Uuid) -> Result<bool, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Claim the transition; an already-paid invoice yields zero rows
        // and the whole call is a no-op.
        let invoice: Option<Invoice> = sqlx::query_as(
            r#"
            UPDATE invoices
            SET status = 'paid', paid_at = NOW(), updated_at = NOW()
            WHERE invoice_id = $1 AND status <> 'paid'
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invoice) = invoice else {
            tx.rollback().await?;
            return Ok(false);
        };

        // The paid plan supersedes whatever was running
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled', updated_at = NOW()
            WHERE org_id = $1 AND status NOT IN ('cancelled', 'expired')
            "#,
        )
        .bind(invoice.org_id)
        .execute(&mut *tx)
        .await?;

        let now = Utc::now();
        let period_end = match invoice.cycle {
            BillingCycle::Monthly => now + Duration::days(30),
            BillingCycle::Yearly => now + Duration::days(365),
        };
        let subscription_id = Uuid::now_v7();

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                subscription_id, org_id, plan_id, status, cycle,
                current_period_start, current_period_end, created_at, updated_at
            )
            VALUES ($1, $2, $3, 'active', $4, $5, $6, $7, $8)
            "#,
        )
        .bind(subscription_id)
        .bind(invoice.org_id)
        .bind(invoice.plan_id)
        .bind(invoice.cycle)
        .bind(now)
        .bind(period_end)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE invoices SET subscription_id = $2 WHERE invoice_id = $1")
            .bind(invoice.invoice_id)
            .bind(subscription_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
