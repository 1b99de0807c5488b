use async_trait::async_trait;
use chrono::Utc;
use platform_service_core::domains::billing::{
    domain::{
        model::{Invoice, InvoiceStatus, PlanLimits, QuotaResource, Usage},
        repository::{InvoiceRepository, PlanRepository, SubscriptionRepository},
        service::{BillingService, Entitlements},
    },
    dto::billing_dto::{BillingOverviewResp, CheckoutReq, CheckoutResp, PlanLimitsResp, UsageResp},
};
use platform_service_core::domains::billing::domain::model::BillingCycle;
use platform_service_core::domains::org::domain::repository::MembershipRepository;
use platform_service_core::domains::project::domain::repository::{
    DeploymentRepository, ProjectRepository,
};
use shared_error::ApiError;
use uuid::Uuid;

/// Plan resolution and quota/feature gating
pub struct EntitlementsImpl<SR, PR, PJR, DR, MR>
where
    SR: SubscriptionRepository,
    PR: PlanRepository,
    PJR: ProjectRepository,
    DR: DeploymentRepository,
    MR: MembershipRepository,
{
    subscription_repo: SR,
    plan_repo: PR,
    project_repo: PJR,
    deployment_repo: DR,
    membership_repo: MR,
}

impl<SR, PR, PJR, DR, MR> EntitlementsImpl<SR, PR, PJR, DR, MR>
where
    SR: SubscriptionRepository,
    PR: PlanRepository,
    PJR: ProjectRepository,
    DR: DeploymentRepository,
    MR: MembershipRepository,
{
    pub fn new(
        subscription_repo: SR,
        plan_repo: PR,
        project_repo: PJR,
        deployment_repo: DR,
        membership_repo: MR,
    ) -> Self {
        Self {
            subscription_repo,
            plan_repo,
            project_repo,
            deployment_repo,
            membership_repo,
        }
    }

    async fn count(&self, org_id: Uuid, resource: QuotaResource) -> Result<i64, ApiError> {
        match resource {
            QuotaResource::Projects => self.project_repo.count_for_org(org_id).await,
            QuotaResource::Deployments => self.deployment_repo.count_running_for_org(org_id).await,
            QuotaResource::Members => self.membership_repo.count_for_org(org_id).await,
        }
    }
}

#[async_trait]
impl<SR, PR, PJR, DR, MR> Entitlements for EntitlementsImpl<SR, PR, PJR, DR, MR>
where
    SR: SubscriptionRepository + Send + Sync,
    PR: PlanRepository + Send + Sync,
    PJR: ProjectRepository + Send + Sync,
    DR: DeploymentRepository + Send + Sync,
    MR: MembershipRepository + Send + Sync,
{
    async fn resolve_limits(&self, org_id: Uuid) -> Result<PlanLimits, ApiError> {
        let Some(subscription) = self.subscription_repo.current_for_org(org_id).await? else {
            return Ok(PlanLimits::free());
        };

        match self.plan_repo.find_by_id(subscription.plan_id).await? {
            Some(plan) => Ok(PlanLimits::from_plan(&plan)),
            None => {
                // Subscription pointing at a vanished plan is a data bug;
                // fall back to Free rather than failing every request.
                tracing::error!(
                    org_id = %org_id,
                    plan_id = %subscription.plan_id,
                    "subscription references unknown plan"
                );
                Ok(PlanLimits::free())
            }
        }
    }

    async fn check_quota(&self, org_id: Uuid, resource: QuotaResource) -> Result<(), ApiError> {
        let limits = self.resolve_limits(org_id).await?;
        let limit = limits.limit_for(resource);
        if limit == -1 {
            return Ok(());
        }

        let count = self.count(org_id, resource).await?;
        if count >= limit as i64 {
            return Err(ApiError::upgrade_required(format!(
                "{} plan allows {} {}; upgrade to create more",
                limits.plan_name,
                limit,
                resource.as_str()
            )));
        }
        Ok(())
    }

    async fn has_feature(&self, org_id: Uuid, feature: &str) -> Result<bool, ApiError> {
        Ok(self.resolve_limits(org_id).await?.has_feature(feature))
    }

    async fn usage(&self, org_id: Uuid) -> Result<Usage, ApiError> {
        Ok(Usage {
            projects: self.count(org_id, QuotaResource::Projects).await?,
            deployments: self.count(org_id, QuotaResource::Deployments).await?,
            members: self.count(org_id, QuotaResource::Members).await?,
        })
    }
}

/// Billing overview, checkout, and provider webhook transitions
pub struct BillingServiceImpl<SR, PR, IR, E>
where
    SR: SubscriptionRepository,
    PR: PlanRepository,
    IR: InvoiceRepository,
    E: Entitlements,
{
    subscription_repo: SR,
    plan_repo: PR,
    invoice_repo: IR,
    entitlements: E,
}

impl<SR, PR, IR, E> BillingServiceImpl<SR, PR, IR, E>
where
    SR: SubscriptionRepository,
    PR: PlanRepository,
    IR: InvoiceRepository,
    E: Entitlements,
{
    pub fn new(subscription_repo: SR, plan_repo: PR, invoice_repo: IR, entitlements: E) -> Self {
        Self {
            subscription_repo,
            plan_repo,
            invoice_repo,
            entitlements,
        }
    }
}

#[async_trait]
impl<SR, PR, IR, E> BillingService for BillingServiceImpl<SR, PR, IR, E>
where
    SR: SubscriptionRepository + Send + Sync,
    PR: PlanRepository + Send + Sync,
    IR: InvoiceRepository + Send + Sync,
    E: Entitlements + Send + Sync,
{
    async fn overview(&self, org_id: Uuid) -> Result<BillingOverviewResp, ApiError> {
        let limits = self.entitlements.resolve_limits(org_id).await?;
        let usage = self.entitlements.usage(org_id).await?;
        let period_end = self
            .subscription_repo
            .current_for_org(org_id)
            .await?
            .map(|s| s.current_period_end);

        Ok(BillingOverviewResp {
            plan: limits.plan_name.clone(),
            limits: PlanLimitsResp::from(&limits),
            usage: UsageResp::from(usage),
            period_end,
        })
    }

    async fn checkout(&self, org_id: Uuid, req: CheckoutReq) -> Result<CheckoutResp, ApiError> {
        let plan = self
            .plan_repo
            .find_by_slug(&req.plan)
            .await?
            .ok_or_else(|| ApiError::not_found("unknown plan"))?;

        let amount = match req.cycle {
            BillingCycle::Monthly => plan.price_monthly,
            BillingCycle::Yearly => plan.price_yearly,
        };

        let now = Utc::now();
        let invoice = Invoice {
            invoice_id: Uuid::now_v7(),
            org_id,
            subscription_id: None,
            plan_id: plan.plan_id,
            cycle: req.cycle,
            external_id: format!("inv_{}", Uuid::new_v4().simple()),
            amount,
            status: InvoiceStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.invoice_repo.create(&invoice).await?;

        Ok(CheckoutResp {
            invoice_id: created.invoice_id,
            external_id: created.external_id,
            amount: created.amount,
        })
    }

    async fn apply_invoice_paid(&self, external_id: &str) -> Result<(), ApiError> {
        let invoice = self
            .invoice_repo
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| ApiError::not_found("unknown invoice"))?;

        let transitioned = self
            .invoice_repo
            .mark_paid_and_activate(invoice.invoice_id)
            .await?;

        if transitioned {
            tracing::info!(
                org_id = %invoice.org_id,
                external_id = %external_id,
                "invoice paid, subscription activated"
            );
        } else {
            // Provider retry of a settled invoice
            tracing::debug!(external_id = %external_id, "duplicate PAID event ignored");
        }
        Ok(())
    }

    async fn apply_invoice_failed(&self, external_id: &str, status: &str) -> Result<(), ApiError> {
        let invoice = self
            .invoice_repo
            .find_by_external_id(external_id)
            .await?
            .ok_or_else(|| ApiError::not_found("unknown invoice"))?;

        tracing::info!(
            org_id = %invoice.org_id,
            external_id = %external_id,
            status = %status,
            "invoice closed unpaid"
        );
        Ok(())
    }
}
