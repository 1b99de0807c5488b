use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::super::domain::model::{AuditLog, Deployment, DeploymentStatus, EnvVar, Project};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProjectReq {
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,

    #[validate(length(max = 500, message = "description too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectReq {
    #[validate(length(min = 1, max = 120, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "description too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectResp {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Project> for ProjectResp {
    fn from(project: &Project) -> Self {
        Self {
            id: project.project_id,
            name: project.name.clone(),
            slug: project.slug.clone(),
            description: project.description.clone(),
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDeploymentReq {
    #[validate(length(min = 1, max = 300, message = "image is required"))]
    pub image: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeploymentResp {
    pub id: Uuid,
    pub image: String,
    #[schema(value_type = String)]
    pub status: DeploymentStatus,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Deployment> for DeploymentResp {
    fn from(deployment: &Deployment) -> Self {
        Self {
            id: deployment.deployment_id,
            image: deployment.image.clone(),
            status: deployment.status,
            url: deployment.url.clone(),
            created_at: deployment.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetEnvVarReq {
    #[validate(length(min = 1, max = 120, message = "key is required"))]
    pub key: String,

    pub value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnvVarResp {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl EnvVarResp {
    pub fn from_decoded(var: &EnvVar, value: String) -> Self {
        Self {
            key: var.key.clone(),
            value,
            updated_at: var.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditLogResp {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&AuditLog> for AuditLogResp {
    fn from(entry: &AuditLog) -> Self {
        Self {
            id: entry.audit_id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            resource_type: entry.resource_type.clone(),
            resource_id: entry.resource_id.clone(),
            metadata: entry.metadata.0.clone(),
            created_at: entry.created_at,
        }
    }
}
