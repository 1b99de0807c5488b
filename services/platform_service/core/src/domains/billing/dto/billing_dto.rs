use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::super::domain::model::{BillingCycle, PlanLimits, Usage};

/// Plan, caps and current usage for the billing page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BillingOverviewResp {
    pub plan: String,
    pub limits: PlanLimitsResp,
    pub usage: UsageResp,
    pub period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanLimitsResp {
    pub max_projects: i32,
    pub max_deployments: i32,
    pub max_members: i32,
    pub features: Vec<String>,
}

impl From<&PlanLimits> for PlanLimitsResp {
    fn from(limits: &PlanLimits) -> Self {
        Self {
            max_projects: limits.max_projects,
            max_deployments: limits.max_deployments,
            max_members: limits.max_members,
            features: limits.features.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageResp {
    pub projects: i64,
    pub deployments: i64,
    pub members: i64,
}

impl From<Usage> for UsageResp {
    fn from(usage: Usage) -> Self {
        Self {
            projects: usage.projects,
            deployments: usage.deployments,
            members: usage.members,
        }
    }
}

/// Start a plan change
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckoutReq {
    #[validate(length(min = 1, message = "plan is required"))]
    pub plan: String,

    #[schema(value_type = String)]
    pub cycle: BillingCycle,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutResp {
    pub invoice_id: Uuid,
    pub external_id: String,
    pub amount: i64,
}

/// Invoice callback body from the billing provider
///
/// Only the fields the transition needs; everything else in the payload is
/// ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct XenditInvoiceEvent {
    pub external_id: String,
    pub status: String,
}
