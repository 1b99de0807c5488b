use axum::extract::{Path, State};
use axum::Json;
use platform_service_core::domains::project::dto::project_dto::{EnvVarResp, SetEnvVarReq};
use serde_json::json;
use shared_auth::{DeveloperRole, OrgContext, RequireOrgRole};
use shared_error::{ApiError, ApiResponse};
use uuid::Uuid;
use validator::Validate;

use crate::state::AppState;

/// Env vars of a project (developer or higher)
///
/// Values pass through the configured codec on the way in and out.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/env-vars",
    tag = "env-vars",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    responses((status = 200, description = "Env vars", body = [EnvVarResp]))
)]
pub async fn list_env_vars(
    State(state): State<AppState>,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
) -> Result<ApiResponse<Vec<EnvVarResp>>, ApiError> {
    let project = require_project(&state, &ctx.org, project_id).await?;

    let vars = state
        .env_var_repo
        .list_for_project(project.project_id)
        .await?;

    let mut decoded = Vec::with_capacity(vars.len());
    for var in &vars {
        let value = state.secret_codec.decode(&var.value)?;
        decoded.push(EnvVarResp::from_decoded(var, value));
    }
    Ok(ApiResponse::success(decoded))
}

/// Create or replace an env var (developer or higher)
#[utoipa::path(
    put,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/env-vars",
    tag = "env-vars",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
    ),
    request_body = SetEnvVarReq,
    responses((status = 200, description = "Env var stored", body = EnvVarResp))
)]
pub async fn put_env_var(
    State(state): State<AppState>,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetEnvVarReq>,
) -> Result<ApiResponse<EnvVarResp>, ApiError> {
    payload.validate()?;

    let project = require_project(&state, &ctx.org, project_id).await?;

    let stored_value = state.secret_codec.encode(&payload.value)?;
    let var = state
        .env_var_repo
        .upsert(project.project_id, &payload.key, &stored_value)
        .await?;

    Ok(ApiResponse::success(EnvVarResp::from_decoded(
        &var,
        payload.value,
    )))
}

/// Delete an env var (developer or higher)
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/projects/{project_id}/env-vars/{key}",
    tag = "env-vars",
    security(("bearer_auth" = [])),
    params(
        ("org_id" = Uuid, Path, description = "Org id"),
        ("project_id" = Uuid, Path, description = "Project id"),
        ("key" = String, Path, description = "Variable name"),
    ),
    responses((status = 200, description = "Env var removed"))
)]
pub async fn delete_env_var(
    State(state): State<AppState>,
    ctx: RequireOrgRole<DeveloperRole>,
    Path((_org_id, project_id, key)): Path<(Uuid, Uuid, String)>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let project = require_project(&state, &ctx.org, project_id).await?;

    let removed = state.env_var_repo.delete(project.project_id, &key).await?;
    if !removed {
        return Err(ApiError::not_found("env var not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": key })))
}

async fn require_project(
    state: &AppState,
    org: &OrgContext,
    project_id: Uuid,
) -> Result<platform_service_core::domains::project::domain::model::Project, ApiError> {
    state
        .project_repo
        .find(org.org_id, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))
}
