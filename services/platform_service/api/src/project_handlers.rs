use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use platform_service_core::domains::org::utils::generate_slug;
use platform_service_core::domains::project::domain::model::Project;
use platform_service_core::domains::project::dto::project_dto::{
    CreateProjectReq, ProjectResp, UpdateProjectReq,
};
use serde_json::json;
use shared_auth::{AuthUser, DeveloperRole, OrgContext, RequireOrgRole};
use shared_error::{ApiError, ApiResponse, PageMeta};
use uuid::Uuid;
use validator::Validate;

use crate::org_handlers::{audit, PageQuery};
use crate::state::AppState;

/// Create a project (developer or higher; quota-gated upstream)
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    request_body = CreateProjectReq,
    responses(
        (status = 201, description = "Project created", body = ProjectResp),
        (status = 402, description = "Project quota reached"),
        (status = 409, description = "Project slug taken in this org"),
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<DeveloperRole>,
    Json(payload): Json<CreateProjectReq>,
) -> Result<ApiResponse<ProjectResp>, ApiError> {
    payload.validate()?;

    let slug = generate_slug(&payload.name).ok_or_else(|| {
        ApiError::validation(
            "Invalid name",
            json!({"name": "must contain alphanumeric characters"}),
        )
    })?;

    if state.project_repo.slug_exists(ctx.org.org_id, &slug).await? {
        return Err(ApiError::conflict("a project with this name exists"));
    }

    let now = Utc::now();
    let project = Project {
        project_id: Uuid::now_v7(),
        org_id: ctx.org.org_id,
        name: payload.name,
        slug,
        description: payload.description,
        created_by: user.user_id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    let created = state.project_repo.create(&project).await?;

    audit(
        &state,
        ctx.org.org_id,
        Some(user.user_id),
        "project.created",
        "project",
        Some(created.project_id.to_string()),
    )
    .await;
    Ok(ApiResponse::created(ProjectResp::from(&created)))
}

/// Projects of the org
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("org_id" = Uuid, Path, description = "Org id")),
    responses((status = 200, description = "Projects", body = [ProjectResp]))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    org: OrgContext,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Vec<ProjectResp>>, ApiError> {
    let (page, per_page) = query.normalize();
    let (projects, total) = state
        .project_repo
        .list_for_org(org.org_id, page, per_page)
        .await?;

    Ok(ApiResponse::with_meta(
        projects.iter().map(ProjectResp::from).collect(),
        PageMeta::new(page, per_page, total),
    ))
}

/// Project details
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    responses((status = 200, description = "Project", body = ProjectResp))
)]
pub async fn get_project(
    State(state): State<AppState>,
    org: OrgContext,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<ProjectResp>, ApiError> {
    let project = state
        .project_repo
        .find(org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    Ok(ApiResponse::success(ProjectResp::from(&project)))
}

/// Update a project (developer or higher)
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    request_body = UpdateProjectReq,
    responses((status = 200, description = "Updated project", body = ProjectResp))
)]
pub async fn update_project(
    State(state): State<AppState>,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProjectReq>,
) -> Result<ApiResponse<ProjectResp>, ApiError> {
    payload.validate()?;

    let mut project = state
        .project_repo
        .find(ctx.org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    if let Some(name) = payload.name {
        project.name = name;
    }
    if let Some(description) = payload.description {
        project.description = Some(description);
    }

    let updated = state.project_repo.update(&project).await?;
    Ok(ApiResponse::success(ProjectResp::from(&updated)))
}

/// Soft-delete a project (developer or higher)
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    responses((status = 200, description = "Project deleted"))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let removed = state
        .project_repo
        .soft_delete(ctx.org.org_id, project_id)
        .await?;
    if !removed {
        return Err(ApiError::not_found("project not found"));
    }

    audit(
        &state,
        ctx.org.org_id,
        Some(user.user_id),
        "project.deleted",
        "project",
        Some(project_id.to_string()),
    )
    .await;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
