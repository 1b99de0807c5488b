use async_trait::async_trait;
use shared_error::ApiError;
use uuid::Uuid;

use super::model::{AuditLog, Deployment, DeploymentStatus, EnvVar, Project};

/// Project repository; every query is org-scoped
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> Result<Project, ApiError>;

    async fn find(&self, org_id: Uuid, project_id: Uuid) -> Result<Option<Project>, ApiError>;

    async fn list_for_org(
        &self,
        org_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Project>, i64), ApiError>;

    async fn update(&self, project: &Project) -> Result<Project, ApiError>;

    async fn soft_delete(&self, org_id: Uuid, project_id: Uuid) -> Result<bool, ApiError>;

    /// Live (non-deleted) projects of the org; the quota input
    async fn count_for_org(&self, org_id: Uuid) -> Result<i64, ApiError>;

    async fn slug_exists(&self, org_id: Uuid, slug: &str) -> Result<bool, ApiError>;
}

/// Deployment repository
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn create(&self, deployment: &Deployment) -> Result<Deployment, ApiError>;

    async fn find(
        &self,
        project_id: Uuid,
        deployment_id: Uuid,
    ) -> Result<Option<Deployment>, ApiError>;

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Deployment>, ApiError>;

    async fn set_status(
        &self,
        deployment_id: Uuid,
        status: DeploymentStatus,
    ) -> Result<Option<Deployment>, ApiError>;

    /// Running deployments whose parent project belongs to the org; the
    /// quota input
    async fn count_running_for_org(&self, org_id: Uuid) -> Result<i64, ApiError>;
}

/// Env-var repository
#[async_trait]
pub trait EnvVarRepository: Send + Sync {
    async fn upsert(&self, project_id: Uuid, key: &str, value: &str) -> Result<EnvVar, ApiError>;

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<EnvVar>, ApiError>;

    async fn delete(&self, project_id: Uuid, key: &str) -> Result<bool, ApiError>;
}

/// Audit trail
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn record(&self, entry: &AuditLog) -> Result<(), ApiError>;

    async fn list_for_org(
        &self,
        org_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<AuditLog>, i64), ApiError>;
}

/// Seam for env-var value protection
///
/// Values are stored cleartext today; an envelope-encryption implementation
/// can replace the codec without touching callers.
pub trait SecretCodec: Send + Sync {
    fn encode(&self, plaintext: &str) -> Result<String, ApiError>;
    fn decode(&self, stored: &str) -> Result<String, ApiError>;
}

/// Identity codec: stores values as-is
pub struct PlaintextCodec;

impl SecretCodec for PlaintextCodec {
    fn encode(&self, plaintext: &str) -> Result<String, ApiError> {
        Ok(plaintext.to_string())
    }

    fn decode(&self, stored: &str) -> Result<String, ApiError> {
        Ok(stored.to_string())
    }
}
