/// Comment model and database operations
///
/// Comments hang off tasks and carry a denormalized `org_id` like tasks do.
/// Deletion is restricted upstream to the author or an org admin.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content TEXT NOT NULL,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     author_id UUID NOT NULL REFERENCES users(id),
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Task this comment belongs to
    pub task_id: Uuid,

    /// Authoring user
    pub author_id: Uuid,

    /// Owning organization (denormalized from the task)
    pub org_id: Uuid,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment on a task
    ///
    /// The task's membership in `org_id` is validated upstream.
    pub async fn create(
        pool: &PgPool,
        org_id: Uuid,
        task_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, task_id, author_id, org_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, content, task_id, author_id, org_id, deleted_at, created_at
            "#,
        )
        .bind(content)
        .bind(task_id)
        .bind(author_id)
        .bind(org_id)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds an active comment within an organization
    pub async fn find_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, task_id, author_id, org_id, deleted_at, created_at
            FROM comments
            WHERE id = $1 AND org_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists active comments on a task, oldest first
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
        org_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, task_id, author_id, org_id, deleted_at, created_at
            FROM comments
            WHERE task_id = $1 AND org_id = $2 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Soft-deletes a comment within an organization
    pub async fn soft_delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET deleted_at = NOW()
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
