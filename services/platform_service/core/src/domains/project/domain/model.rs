use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Project entity, org-owned
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub project_id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Queued,
    Running,
    Stopped,
    Failed,
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStatus::Queued => write!(f, "queued"),
            DeploymentStatus::Running => write!(f, "running"),
            DeploymentStatus::Stopped => write!(f, "stopped"),
            DeploymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Deployment of a project
///
/// Only `running` rows count against the deployment quota.
#[derive(Debug, Clone, FromRow)]
pub struct Deployment {
    pub deployment_id: Uuid,
    pub project_id: Uuid,
    pub image: String,
    pub status: DeploymentStatus,
    pub url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Environment variable of a project
///
/// `(project_id, key)` is unique. The value column is whatever the
/// configured `SecretCodec` produced.
#[derive(Debug, Clone, FromRow)]
pub struct EnvVar {
    pub env_var_id: Uuid,
    pub project_id: Uuid,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Org-scoped audit trail entry
#[derive(Debug, Clone, FromRow)]
pub struct AuditLog {
    pub audit_id: Uuid,
    pub org_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub metadata: sqlx::types::Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        org_id: Uuid,
        user_id: Option<Uuid>,
        action: &str,
        resource_type: &str,
        resource_id: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            audit_id: Uuid::now_v7(),
            org_id,
            user_id,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id,
            metadata: sqlx::types::Json(metadata),
            created_at: Utc::now(),
        }
    }
}
