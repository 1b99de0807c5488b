use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billing plan, immutable after seed
///
/// Caps use -1 for unlimited; features are a set of names.
#[derive(Debug, Clone, FromRow)]
pub struct BillingPlan {
    pub plan_id: Uuid,
    pub name: String,
    pub slug: String,
    pub price_monthly: i64,
    pub price_yearly: i64,
    pub max_projects: i32,
    pub max_deployments: i32,
    pub max_members: i32,
    pub features: sqlx::types::Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Terminal subscriptions no longer resolve a plan
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

/// Subscription of an org to a plan
///
/// At most one non-terminal subscription exists per org at a time.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub subscription_id: Uuid,
    pub org_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub cycle: BillingCycle,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Expired,
    Failed,
}

/// Invoice issued for a subscription period
///
/// `external_id` ties the row to the billing provider; the PAID webhook
/// transition is idempotent on it.
#[derive(Debug, Clone, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub org_id: Uuid,
    /// Set when payment activates the subscription
    pub subscription_id: Option<Uuid>,
    pub plan_id: Uuid,
    pub cycle: BillingCycle,
    pub external_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolved limits for an org: the active plan's caps, or Free defaults
#[derive(Debug, Clone, Serialize)]
pub struct PlanLimits {
    pub plan_name: String,
    pub max_projects: i32,
    pub max_deployments: i32,
    pub max_members: i32,
    pub features: Vec<String>,
}

impl PlanLimits {
    /// Built-in Free tier used when no subscription resolves
    pub fn free() -> Self {
        Self {
            plan_name: "Free".to_string(),
            max_projects: 1,
            max_deployments: 5,
            max_members: 1,
            features: Vec::new(),
        }
    }

    pub fn from_plan(plan: &BillingPlan) -> Self {
        Self {
            plan_name: plan.name.clone(),
            max_projects: plan.max_projects,
            max_deployments: plan.max_deployments,
            max_members: plan.max_members,
            features: plan.features.0.clone(),
        }
    }

    pub fn limit_for(&self, resource: QuotaResource) -> i32 {
        match resource {
            QuotaResource::Projects => self.max_projects,
            QuotaResource::Deployments => self.max_deployments,
            QuotaResource::Members => self.max_members,
        }
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }
}

/// Counted resources gated by plan quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaResource {
    Projects,
    Deployments,
    Members,
}

impl QuotaResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaResource::Projects => "projects",
            QuotaResource::Deployments => "deployments",
            QuotaResource::Members => "members",
        }
    }
}

/// Current resource usage of an org
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Usage {
    pub projects: i64,
    pub deployments: i64,
    pub members: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_defaults() {
        let limits = PlanLimits::free();
        assert_eq!(limits.max_projects, 1);
        assert_eq!(limits.max_deployments, 5);
        assert_eq!(limits.max_members, 1);
        assert!(!limits.has_feature("audit_logs"));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SubscriptionStatus::Cancelled.is_terminal());
        assert!(SubscriptionStatus::Expired.is_terminal());
        assert!(!SubscriptionStatus::Active.is_terminal());
        assert!(!SubscriptionStatus::Trialing.is_terminal());
        assert!(!SubscriptionStatus::PastDue.is_terminal());
    }
}
