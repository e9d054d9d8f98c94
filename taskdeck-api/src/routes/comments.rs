/// Comment endpoints
///
/// # Endpoints
///
/// - `POST   /v1/comments` - Comment on a task (any member)
/// - `GET    /v1/tasks/:id/comments` - List a task's comments
/// - `DELETE /v1/comments/:id` - Delete (author or ADMIN)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::MessageResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::{authorization::require_organization, middleware::AuthContext},
    models::{comment::Comment, task::Task, user::OrgRole},
};
use uuid::Uuid;
use validator::Validate;

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Task being commented on
    pub task_id: Uuid,

    /// Comment body
    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

/// Creates a comment on a task in the caller's organization
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    Task::find_in_org(&state.db, req.task_id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comment =
        Comment::create(&state.db, org_id, req.task_id, auth.user_id, &req.content).await?;

    Ok(Json(comment))
}

/// Lists a task's comments, oldest first
pub async fn list_for_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let org_id = require_organization(&auth)?;

    Task::find_in_org(&state.db, task_id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comments = Comment::list_for_task(&state.db, task_id, org_id).await?;

    Ok(Json(comments))
}

/// Deletes a comment (author or ADMIN)
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let org_id = require_organization(&auth)?;

    let comment = Comment::find_in_org(&state.db, id, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != auth.user_id && auth.role != Some(OrgRole::Admin) {
        return Err(ApiError::Forbidden(
            "Only the comment author or an admin can delete this comment".to_string(),
        ));
    }

    Comment::soft_delete(&state.db, id, org_id).await?;

    Ok(Json(MessageResponse {
        message: "Comment deleted".to_string(),
    }))
}
