/// Task model and database operations
///
/// Tasks live inside a project but carry a denormalized `org_id`, so tenant
/// checks never need to join through projects. New tasks start in `todo`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     project_id UUID NOT NULL REFERENCES projects(id),
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     creator_id UUID NOT NULL REFERENCES users(id),
///     assignee_id UUID REFERENCES users(id),
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// Task within a project
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Workflow status
    pub status: TaskStatus,

    /// Parent project
    pub project_id: Uuid,

    /// Owning organization (denormalized from the project)
    pub org_id: Uuid,

    /// User who created the task
    pub creator_id: Uuid,

    /// Assigned user, if any; must be a member of the same organization
    pub assignee_id: Option<Uuid>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning organization
    pub org_id: Uuid,

    /// Parent project (must belong to `org_id`, validated upstream)
    pub project_id: Uuid,

    /// Creating user
    pub creator_id: Uuid,

    /// Short title
    pub title: String,

    /// Description, empty by default
    pub description: String,

    /// Initial assignee (must belong to `org_id`, validated upstream)
    pub assignee_id: Option<Uuid>,
}

/// Input for updating a task; only non-None fields change
///
/// `assignee_id` is doubly optional: `Some(None)` clears the assignment,
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New workflow status
    pub status: Option<TaskStatus>,

    /// New assignee (`Some(None)` to unassign)
    pub assignee_id: Option<Option<Uuid>>,
}

const TASK_COLUMNS: &str = "id, title, description, status, project_id, org_id, creator_id, \
     assignee_id, deleted_at, created_at, updated_at";

impl Task {
    /// Creates a task in `todo` status
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, project_id, org_id, creator_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.org_id)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds an active task within an organization
    pub async fn find_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE id = $1 AND org_id = $2 AND deleted_at IS NULL
            "#,
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists active tasks of an organization, optionally filtered by project
    pub async fn list_in_org(
        pool: &PgPool,
        org_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE org_id = $1
              AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(org_id)
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND org_id = $2 AND deleted_at IS NULL RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(org_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(assignee) = data.assignee_id {
            q = q.bind(assignee);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Soft-deletes a task within an organization
    pub async fn soft_delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND org_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(org_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );

        let status: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_update_task_assignee_levels() {
        // None leaves assignment alone; Some(None) clears it
        let untouched = UpdateTask::default();
        assert!(untouched.assignee_id.is_none());

        let cleared = UpdateTask {
            assignee_id: Some(None),
            ..Default::default()
        };
        assert_eq!(cleared.assignee_id, Some(None));
    }
}
