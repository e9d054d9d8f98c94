/// Organization model and database operations
///
/// Organizations are the tenancy boundary: every project, task, and comment
/// belongs to exactly one. Deletion is a soft delete that tombstones the row
/// and detaches every member in a single transaction, so the unique name
/// slot is freed and no member keeps residual access.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organization (tenant)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID
    pub id: Uuid,

    /// Organization name, unique among active organizations
    ///
    /// Tombstoned rows are renamed to `deleted - {name}` so the slot can be
    /// reused
    pub name: String,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate name (unique constraint) or database
    /// failure.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, deleted_at, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(org)
    }

    /// Creates an organization and installs its founding admin, atomically
    ///
    /// The member update is guarded by `organization_id IS NULL` against the
    /// live user row, not token claims, so a founder who joined another
    /// organization since their token was issued loses the race: the
    /// transaction rolls back, `None` comes back, and no orphan organization
    /// is left behind.
    pub async fn create_with_admin(
        pool: &PgPool,
        name: &str,
        admin_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, deleted_at, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        let attached = sqlx::query(
            r#"
            UPDATE users
            SET organization_id = $2, role = 'admin', updated_at = NOW()
            WHERE id = $1 AND organization_id IS NULL AND deleted_at IS NULL
            "#,
        )
        .bind(admin_id)
        .bind(org.id)
        .execute(&mut *tx)
        .await?;

        if attached.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        Ok(Some(org))
    }

    /// Finds an active organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, deleted_at, created_at, updated_at
            FROM organizations
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Finds an active organization by name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, deleted_at, created_at, updated_at
            FROM organizations
            WHERE name = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Renames an active organization
    pub async fn update_name(
        pool: &PgPool,
        id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, deleted_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Lists active organizations with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let orgs = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, deleted_at, created_at, updated_at
            FROM organizations
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(orgs)
    }

    /// Soft-deletes an organization and detaches every member, atomically
    ///
    /// One transaction:
    /// 1. Collects active member emails (for post-commit notifications).
    /// 2. Tombstones the organization: `deleted_at` set, name prefixed with
    ///    `deleted - ` so the unique slot is freed.
    /// 3. Detaches all members: `organization_id` cleared, role reset to
    ///    member.
    ///
    /// Returns the tombstoned organization and the member emails, or `None`
    /// if the organization was not found or already deleted. Notification
    /// emails are the caller's job and happen strictly after commit.
    pub async fn soft_delete_cascade(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<(Self, Vec<String>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let member_emails: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT email FROM users
            WHERE organization_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET deleted_at = NOW(),
                name = 'deleted - ' || name,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, deleted_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(org) = org else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE users
            SET organization_id = NULL, role = 'member', updated_at = NOW()
            WHERE organization_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((
            org,
            member_emails.into_iter().map(|(email,)| email).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    // Creation and soft-delete cascade semantics are covered by the
    // DB-backed integration tests in taskdeck-api/tests/organization_test.rs.
}
