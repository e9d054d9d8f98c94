/// Task endpoints
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create (ADMIN, MANAGER); starts in TODO
/// - `GET    /v1/tasks` - List org tasks, optional `?project_id=` filter
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PATCH  /v1/tasks/:id` - Update (ADMIN, MANAGER)
/// - `DELETE /v1/tasks/:id` - Soft delete (ADMIN)
///
/// The referenced project and assignee must exist in the caller's
/// organization; cross-tenant IDs are indistinguishable from missing ones.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::MessageResponse,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::{authorization::require_organization, middleware::AuthContext},
    models::{
        project::Project,
        task::{CreateTask, Task, TaskStatus, UpdateTask},
        user::User,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Parent project
    pub project_id: Uuid,

    /// Title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Initial assignee
    pub assignee_id: Option<Uuid>,
}

/// Update task request
///
/// `assignee_id` is doubly optional: omitted leaves the assignment alone,
/// explicit `null` clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New workflow status
    pub status: Option<TaskStatus>,

    /// New assignee (explicit null unassigns)
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Distinguishes an omitted field (`None`) from an explicit JSON `null`
/// (`Some(None)`)
fn double_option<'de, D>(de: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Restrict to one project
    pub project_id: Option<Uuid>,
}

/// Creates a task in TODO status (ADMIN, MANAGER)
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    Project::find_in_org(&state.db, req.project_id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    if let Some(assignee_id) = req.assignee_id {
        User::find_in_org(&state.db, assignee_id, org_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            org_id,
            project_id: req.project_id,
            creator_id: auth.user_id,
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
        },
    )
    .await?;

    Ok(Json(task))
}

/// Lists the organization's tasks, optionally filtered by project
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let org_id = require_organization(&auth)?;

    let tasks = Task::list_in_org(&state.db, org_id, params.project_id).await?;

    Ok(Json(tasks))
}

/// Fetches one task
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let org_id = require_organization(&auth)?;

    let task = Task::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Updates a task (ADMIN, MANAGER)
///
/// A new assignee is re-validated against the organization.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    if let Some(Some(assignee_id)) = req.assignee_id {
        User::find_in_org(&state.db, assignee_id, org_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Assignee not found".to_string()))?;
    }

    let task = Task::update(
        &state.db,
        id,
        org_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Soft-deletes a task (ADMIN)
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let org_id = require_organization(&auth)?;

    let deleted = Task::soft_delete(&state.db, id, org_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
