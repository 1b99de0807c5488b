use async_trait::async_trait;
use platform_service_core::domains::project::domain::{
    model::{AuditLog, Deployment, DeploymentStatus, EnvVar, Project},
    repository::{AuditLogRepository, DeploymentRepository, EnvVarRepository, ProjectRepository},
};
use shared_error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of ProjectRepository
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project, ApiError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                project_id, org_id, name, slug, description, created_by,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(project.project_id)
        .bind(project.org_id)
        .bind(&project.name)
        .bind(&project.slug)
        .bind(&project.description)
        .bind(project.created_by)
        .bind(project.created_at)
        .bind(project.updated_at)
        .bind(project.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    async fn find(&self, org_id: Uuid, project_id: Uuid) -> Result<Option<Project>, ApiError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects
             WHERE org_id = $1 AND project_id = $2 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn list_for_org(
        &self,
        org_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Project>, i64), ApiError> {
        let offset = (page - 1).max(0) * per_page;

        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE org_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE org_id = $1 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((projects, total))
    }

    async fn update(&self, project: &Project) -> Result<Project, ApiError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $3, description = $4, updated_at = NOW()
            WHERE org_id = $1 AND project_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(project.org_id)
        .bind(project.project_id)
        .bind(&project.name)
        .bind(&project.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    async fn soft_delete(&self, org_id: Uuid, project_id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW(), updated_at = NOW()
             WHERE org_id = $1 AND project_id = $2 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_for_org(&self, org_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE org_id = $1 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn slug_exists(&self, org_id: Uuid, slug: &str) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM projects
                WHERE org_id = $1 AND slug = $2 AND deleted_at IS NULL
            )",
        )
        .bind(org_id)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// PostgreSQL implementation of DeploymentRepository
#[derive(Clone)]
pub struct PgDeploymentRepository {
    pool: PgPool,
}

impl PgDeploymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentRepository for PgDeploymentRepository {
    async fn create(&self, deployment: &Deployment) -> Result<Deployment, ApiError> {
        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            INSERT INTO deployments (
                deployment_id, project_id, image, status, url, created_by,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(deployment.deployment_id)
        .bind(deployment.project_id)
        .bind(&deployment.image)
        .bind(deployment.status)
        .bind(&deployment.url)
        .bind(deployment.created_by)
        .bind(deployment.created_at)
        .bind(deployment.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(deployment)
    }

    async fn find(
        &self,
        project_id: Uuid,
        deployment_id: Uuid,
    ) -> Result<Option<Deployment>, ApiError> {
        let deployment = sqlx::query_as::<_, Deployment>(
            "SELECT * FROM deployments WHERE project_id = $1 AND deployment_id = $2",
        )
        .bind(project_id)
        .bind(deployment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deployment)
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Deployment>, ApiError> {
        let deployments = sqlx::query_as::<_, Deployment>(
            "SELECT * FROM deployments WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(deployments)
    }

    async fn set_status(
        &self,
        deployment_id: Uuid,
        status: DeploymentStatus,
    ) -> Result<Option<Deployment>, ApiError> {
        let deployment = sqlx::query_as::<_, Deployment>(
            r#"
            UPDATE deployments
            SET status = $2, updated_at = NOW()
            WHERE deployment_id = $1
            RETURNING *
            "#,
        )
        .bind(deployment_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deployment)
    }

    async fn count_running_for_org(&self, org_id: Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM deployments d
            JOIN projects p ON p.project_id = d.project_id
            WHERE p.org_id = $1 AND d.status = 'running' AND p.deleted_at IS NULL
            "#,
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// PostgreSQL implementation of EnvVarRepository
#[derive(Clone)]
pub struct PgEnvVarRepository {
    pool: PgPool,
}

impl PgEnvVarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnvVarRepository for PgEnvVarRepository {
    async fn upsert(&self, project_id: Uuid, key: &str, value: &str) -> Result<EnvVar, ApiError> {
        let var = sqlx::query_as::<_, EnvVar>(
            r#"
            INSERT INTO env_vars (env_var_id, project_id, key, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (project_id, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(var)
    }

    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<EnvVar>, ApiError> {
        let vars = sqlx::query_as::<_, EnvVar>(
            "SELECT * FROM env_vars WHERE project_id = $1 ORDER BY key",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vars)
    }

    async fn delete(&self, project_id: Uuid, key: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM env_vars WHERE project_id = $1 AND key = $2")
            .bind(project_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of AuditLogRepository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn record(&self, entry: &AuditLog) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                audit_id, org_id, user_id, action, resource_type, resource_id,
                metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.audit_id)
        .bind(entry.org_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_org(
        &self,
        org_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<AuditLog>, i64), ApiError> {
        let offset = (page - 1).max(0) * per_page;

        let entries = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE org_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(org_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE org_id = $1")
            .bind(org_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((entries, total))
    }
}
