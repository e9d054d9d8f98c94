/// User model and database operations
///
/// Users carry both authorization axes: an optional organization-scoped role
/// (`role`, meaningful only while `organization_id` is set) and a system-wide
/// role. Verification and password-reset state live directly on the row as
/// single-use token slots with expiries.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role org_role,
///     system_role system_role NOT NULL DEFAULT 'user',
///     organization_id UUID REFERENCES organizations(id),
///     verified BOOLEAN NOT NULL DEFAULT FALSE,
///     verification_token TEXT,
///     verification_token_expires_at TIMESTAMPTZ,
///     reset_token TEXT,
///     reset_token_expires_at TIMESTAMPTZ,
///     deleted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, User};
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     ..Default::default()
/// }).await?;
///
/// let found = User::find_by_email(&pool, "alice@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organization-scoped role
///
/// Serialized as SCREAMING_SNAKE_CASE on the wire (JWT claims, API bodies)
/// and as lowercase in the `org_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgRole {
    /// Full control over the organization, its members, and its resources
    Admin,

    /// Can manage projects and tasks, but not members or the organization
    Manager,

    /// Regular member
    Member,
}

impl OrgRole {
    /// Wire-format name, as embedded in claims and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Admin => "ADMIN",
            OrgRole::Manager => "MANAGER",
            OrgRole::Member => "MEMBER",
        }
    }
}

/// System-wide role, orthogonal to organization roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "system_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    /// Platform operator; bypasses org-role checks outside an org context
    SuperAdmin,

    /// Regular account
    User,
}

impl SystemRole {
    /// Wire-format name
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::SuperAdmin => "SUPER_ADMIN",
            SystemRole::User => "USER",
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT), unique across all users
    /// including soft-deleted ones
    pub email: String,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Organization-scoped role; only meaningful while `organization_id` is set
    pub role: Option<OrgRole>,

    /// System-wide role
    pub system_role: SystemRole,

    /// Organization the user belongs to, at most one
    pub organization_id: Option<Uuid>,

    /// Whether the email address has been verified
    pub verified: bool,

    /// Pending email-verification token (single slot, newest wins)
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,

    /// Expiry of the pending verification token
    #[serde(skip_serializing)]
    pub verification_token_expires_at: Option<DateTime<Utc>>,

    /// Pending password-reset token (single slot, newest wins)
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,

    /// Expiry of the pending reset token
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    /// Soft-delete marker; deleted users cannot authenticate but their
    /// email stays reserved
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// Covers all creation paths: self-registration (unverified, with a
/// verification token), OAuth signup (verified, throwaway hash), and admin
/// invitation (verified, attached to an org with a reset token).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// Start verified (OAuth and invited accounts)
    pub verified: bool,

    /// Pending verification token for self-registration
    pub verification_token: Option<String>,

    /// Verification token expiry
    pub verification_token_expires_at: Option<DateTime<Utc>>,

    /// Pending reset token for invited accounts
    pub reset_token: Option<String>,

    /// Reset token expiry
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    /// Organization to attach to (invitations)
    pub organization_id: Option<Uuid>,

    /// Organization role (invitations)
    pub role: Option<OrgRole>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, system_role, organization_id, \
     verified, verification_token, verification_token_expires_at, \
     reset_token, reset_token_expires_at, deleted_at, created_at, updated_at";

impl User {
    /// Organization role usable for authorization decisions
    ///
    /// A detached user may still carry a residual `role` column value; it is
    /// only meaningful while the user belongs to an organization.
    pub fn org_role(&self) -> Option<OrgRole> {
        self.organization_id.and(self.role)
    }

    /// Whether the account is soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint,
    /// soft-deleted accounts included) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, verified,
                               verification_token, verification_token_expires_at,
                               reset_token, reset_token_expires_at,
                               organization_id, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.verified)
        .bind(data.verification_token)
        .bind(data.verification_token_expires_at)
        .bind(data.reset_token)
        .bind(data.reset_token_expires_at)
        .bind(data.organization_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email, soft-deleted accounts included
    ///
    /// Registration uses this to treat a soft-deleted account's email as
    /// still taken. Authentication paths must check [`User::is_deleted`].
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds an active (not soft-deleted) user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds an active user holding the given reset token
    ///
    /// Password reset is keyed by token value alone; expiry is checked by the
    /// caller so that not-found and expired collapse into one response.
    pub async fn find_by_reset_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1 AND deleted_at IS NULL",
        ))
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores a fresh verification token, overwriting any prior one
    pub async fn set_verification_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_token = $2,
                verification_token_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the account verified and clears the verification token slot
    pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE,
                verification_token = NULL,
                verification_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a fresh password-reset token, overwriting any prior one
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2,
                reset_token_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the password hash and clears the reset token slot
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Attaches an organization-less user to an organization with a role
    ///
    /// The `organization_id IS NULL` guard makes attachment race-safe: a
    /// concurrent attach loses and affects zero rows.
    pub async fn attach_to_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        role: OrgRole,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET organization_id = $2,
                role = $3,
                updated_at = NOW()
            WHERE id = $1 AND organization_id IS NULL AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Detaches a user from their organization, resetting the role to member
    pub async fn detach_from_org(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET organization_id = NULL,
                role = 'member',
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists active members of an organization, newest first
    pub async fn list_in_org(pool: &PgPool, org_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE organization_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        ))
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Finds an active member of an organization by ID
    ///
    /// Tenant-scoped lookup: an ID from another organization (or a
    /// soft-deleted member) comes back as `None`.
    pub async fn find_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL
            "#,
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Changes a member's organization role
    pub async fn update_role_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
        role: OrgRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET role = $3, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(org_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Soft-deletes a member of an organization
    ///
    /// The row survives (its email stays reserved); the account can no longer
    /// authenticate.
    pub async fn soft_delete_in_org(
        pool: &PgPool,
        id: Uuid,
        org_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(OrgRole::Admin.as_str(), "ADMIN");
        assert_eq!(OrgRole::Manager.as_str(), "MANAGER");
        assert_eq!(OrgRole::Member.as_str(), "MEMBER");
        assert_eq!(SystemRole::SuperAdmin.as_str(), "SUPER_ADMIN");
        assert_eq!(SystemRole::User.as_str(), "USER");
    }

    #[test]
    fn test_role_serde_screaming_snake() {
        assert_eq!(serde_json::to_string(&OrgRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::to_string(&SystemRole::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );

        let role: OrgRole = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, OrgRole::Manager);
    }

    #[test]
    fn test_org_role_requires_membership() {
        let mut user = sample_user();
        user.organization_id = Some(Uuid::new_v4());
        user.role = Some(OrgRole::Admin);
        assert_eq!(user.org_role(), Some(OrgRole::Admin));

        // Residual role column on a detached user carries no authority
        user.organization_id = None;
        assert_eq!(user.org_role(), None);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token").is_none());
        assert!(json.get("verification_token").is_none());
        assert!(json.get("email").is_some());
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: None,
            system_role: SystemRole::User,
            organization_id: None,
            verified: true,
            verification_token: Some("vtok".to_string()),
            verification_token_expires_at: None,
            reset_token: Some("rtok".to_string()),
            reset_token_expires_at: None,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // Integration tests for database operations are in taskdeck-api/tests/
}
