use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use platform_service_core::domains::project::domain::model::{Deployment, DeploymentStatus};
use platform_service_core::domains::project::dto::project_dto::{
    CreateDeploymentReq, DeploymentResp,
};
use shared_auth::{AuthUser, DeveloperRole, OrgContext, RequireOrgRole};
use shared_error::{ApiError, ApiResponse};
use uuid::Uuid;
use validator::Validate;

use crate::org_handlers::audit;
use crate::state::AppState;

/// Create a deployment (developer or higher; quota-gated upstream)
///
/// The control plane records the desired state; the build/runtime plane
/// picks it up out of band.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/deployments",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    request_body = CreateDeploymentReq,
    responses(
        (status = 201, description = "Deployment queued", body = DeploymentResp),
        (status = 402, description = "Running-deployment quota reached"),
    )
)]
pub async fn create_deployment(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateDeploymentReq>,
) -> Result<ApiResponse<DeploymentResp>, ApiError> {
    payload.validate()?;

    let project = state
        .project_repo
        .find(ctx.org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    let now = Utc::now();
    let deployment = Deployment {
        deployment_id: Uuid::now_v7(),
        project_id: project.project_id,
        image: payload.image,
        status: DeploymentStatus::Running,
        url: None,
        created_by: user.user_id,
        created_at: now,
        updated_at: now,
    };
    let created = state.deployment_repo.create(&deployment).await?;

    audit(
        &state,
        ctx.org.org_id,
        Some(user.user_id),
        "deployment.created",
        "deployment",
        Some(created.deployment_id.to_string()),
    )
    .await;
    Ok(ApiResponse::created(DeploymentResp::from(&created)))
}

/// Deployments of a project
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/deployments",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    responses((status = 200, description = "Deployments", body = [DeploymentResp]))
)]
pub async fn list_deployments(
    State(state): State<AppState>,
    org: OrgContext,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Vec<DeploymentResp>>, ApiError> {
    let project = state
        .project_repo
        .find(org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    let deployments = state
        .deployment_repo
        .list_for_project(project.project_id)
        .await?;
    Ok(ApiResponse::success(
        deployments.iter().map(DeploymentResp::from).collect(),
    ))
}

/// Stop a running deployment (developer or higher)
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/deployments/{deployment_id}/stop",
    tag = "deployments",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
        ("deployment_id" = Uuid, Path, description = "Deployment id"),
    ),
    responses((status = 200, description = "Deployment stopped", body = DeploymentResp))
)]
pub async fn stop_deployment(
    State(state): State<AppState>,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id, deployment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<ApiResponse<DeploymentResp>, ApiError> {
    let project = state
        .project_repo
        .find(ctx.org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    // Verify the deployment belongs to this project before touching it
    state
        .deployment_repo
        .find(project.project_id, deployment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("deployment not found"))?;

    let stopped = state
        .deployment_repo
        .set_status(deployment_id, DeploymentStatus::Stopped)
        .await?
        .ok_or_else(|| ApiError::not_found("deployment not found"))?;

    Ok(ApiResponse::success(DeploymentResp::from(&stopped)))
}
