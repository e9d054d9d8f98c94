/// Project endpoints
///
/// # Endpoints
///
/// - `POST   /v1/projects` - Create (ADMIN, MANAGER)
/// - `GET    /v1/projects` - List org projects
/// - `GET    /v1/projects/:id` - Detail with members and task progress
/// - `PATCH  /v1/projects/:id` - Update (project manager or ADMIN)
/// - `DELETE /v1/projects/:id` - Soft delete (project manager or ADMIN)
///
/// Every lookup is org-scoped: an ID from another organization is a 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{authorization::require_organization, middleware::AuthContext},
    models::{
        project::{CreateProject, Project, ProjectStatus, UpdateProject},
        user::{OrgRole, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Manager; defaults to the creator
    pub manager_id: Option<Uuid>,

    /// Initial member list
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Update project request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New lifecycle status
    pub status: Option<ProjectStatus>,

    /// New manager (must be a member of the organization)
    pub manager_id: Option<Uuid>,
}

/// Project detail with members and completion percentage
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    /// The project itself
    #[serde(flatten)]
    pub project: Project,

    /// Member user IDs
    pub member_ids: Vec<Uuid>,

    /// Percentage of live tasks that are done, rounded; 0 with no tasks
    pub progress: u8,
}

/// Manager-or-admin gate shared by update and delete
fn require_manager_or_admin(auth: &AuthContext, project: &Project) -> Result<(), ApiError> {
    if auth.role == Some(OrgRole::Admin) || auth.user_id == project.manager_id {
        return Ok(());
    }

    Err(ApiError::Forbidden(
        "Only the project manager or an admin can modify this project".to_string(),
    ))
}

/// Verifies that a user ID is an active member of the organization
async fn ensure_member(state: &AppState, id: Uuid, org_id: Uuid, what: &str) -> ApiResult<()> {
    User::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{what} not found")))?;

    Ok(())
}

/// Creates a project (ADMIN, MANAGER)
///
/// The manager defaults to the creator and is always a member. All
/// referenced users must be active members of the caller's organization.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    let manager_id = req.manager_id.unwrap_or(auth.user_id);
    ensure_member(&state, manager_id, org_id, "Manager").await?;

    for member_id in &req.member_ids {
        ensure_member(&state, *member_id, org_id, "Member").await?;
    }

    let project = Project::create(
        &state.db,
        CreateProject {
            organization_id: org_id,
            name: req.name,
            description: req.description,
            manager_id,
            member_ids: req.member_ids,
        },
    )
    .await?;

    Ok(Json(project))
}

/// Lists the organization's projects
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let org_id = require_organization(&auth)?;

    let projects = Project::list_in_org(&state.db, org_id).await?;

    Ok(Json(projects))
}

/// Fetches one project with its member list and task progress
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let org_id = require_organization(&auth)?;

    let project = Project::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let member_ids = Project::member_ids(&state.db, project.id).await?;
    let progress = Project::progress(&state.db, project.id).await?;

    Ok(Json(ProjectDetail {
        project,
        member_ids,
        progress,
    }))
}

/// Updates a project (project manager or ADMIN)
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    let project = Project::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_manager_or_admin(&auth, &project)?;

    if let Some(manager_id) = req.manager_id {
        ensure_member(&state, manager_id, org_id, "Manager").await?;
    }

    let project = Project::update(
        &state.db,
        id,
        org_id,
        UpdateProject {
            name: req.name,
            description: req.description,
            status: req.status,
            manager_id: req.manager_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}

/// Soft-deletes a project (project manager or ADMIN)
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let org_id = require_organization(&auth)?;

    let project = Project::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    require_manager_or_admin(&auth, &project)?;

    Project::soft_delete(&state.db, id, org_id).await?;

    Ok(Json(MessageResponse {
        message: "Project deleted".to_string(),
    }))
}
