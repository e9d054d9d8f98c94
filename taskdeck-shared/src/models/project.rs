/// Project model and database operations
///
/// Projects group tasks inside an organization. Each project has a manager
/// and a member list (junction table); the manager is always a member.
/// Every lookup is keyed by `(id, organization_id)` and filters soft-deleted
/// rows, so cross-tenant IDs surface as not-found.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('active', 'archived', 'completed');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status project_status NOT NULL DEFAULT 'active',
///     organization_id UUID NOT NULL REFERENCES organizations(id),
///     manager_id UUID NOT NULL REFERENCES users(id),
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Archived,
    Completed,
}

/// Project within an organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Owning organization
    pub organization_id: Uuid,

    /// Manager; may update/delete the project regardless of org role
    pub manager_id: Uuid,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Owning organization
    pub organization_id: Uuid,

    /// Project name
    pub name: String,

    /// Description, empty by default
    pub description: String,

    /// Manager (defaults to the creator upstream)
    pub manager_id: Uuid,

    /// Initial member list; the manager is added regardless
    pub member_ids: Vec<Uuid>,
}

/// Input for updating a project; only non-None fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New lifecycle status
    pub status: Option<ProjectStatus>,

    /// New manager
    pub manager_id: Option<Uuid>,
}

const PROJECT_COLUMNS: &str = "id, name, description, status, organization_id, manager_id, \
     deleted_at, created_at, updated_at";

impl Project {
    /// Creates a project and its member list in one transaction
    ///
    /// The manager is always inserted into the junction table; duplicate
    /// member IDs are collapsed by `ON CONFLICT DO NOTHING`.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, organization_id, manager_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.organization_id)
        .bind(data.manager_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut member_ids = data.member_ids;
        member_ids.push(data.manager_id);

        for user_id in member_ids {
            sqlx::query(
                r#"
                INSERT INTO project_members (project_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(project.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(project)
    }

    /// Finds an active project within an organization
    pub async fn find_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL
            "#,
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists active projects of an organization, newest first
    pub async fn list_in_org(pool: &PgPool, org_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE organization_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        ))
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates a project; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.manager_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", manager_id = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL RETURNING {PROJECT_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id).bind(org_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(manager_id) = data.manager_id {
            q = q.bind(manager_id);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Soft-deletes a project within an organization
    pub async fn soft_delete(pool: &PgPool, id: Uuid, org_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(org_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the member user IDs of a project
    pub async fn member_ids(pool: &PgPool, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM project_members WHERE project_id = $1")
                .bind(project_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Percentage of the project's live tasks that are done, rounded
    ///
    /// A project with no tasks reports 0.
    pub async fn progress(pool: &PgPool, project_id: Uuid) -> Result<u8, sqlx::Error> {
        let (total, done): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'done')
            FROM tasks
            WHERE project_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        if total == 0 {
            return Ok(0);
        }

        Ok(((done as f64 / total as f64) * 100.0).round() as u8)
    }
}
