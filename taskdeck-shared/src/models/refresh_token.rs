/// Persisted refresh-token records
///
/// Each successful login or rotation stores the opaque refresh JWT in the
/// database; refresh is only honored for a stored, unrevoked, unexpired
/// record. Rotation revokes the presented record before minting a new one,
/// so a replayed refresh token fails cleanly. Logout deletes all records for
/// the user and is idempotent.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token TEXT NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Server-side lifetime of a stored refresh token, matching the JWT expiry
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Stored refresh token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique record ID
    pub id: Uuid,

    /// The refresh JWT itself, unique
    pub token: String,

    /// Owning user
    pub user_id: Uuid,

    /// When the token stops being honored
    pub expires_at: DateTime<Utc>,

    /// Set when the token is revoked (rotation); revoked tokens are never
    /// honored again
    pub revoked_at: Option<DateTime<Utc>>,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token is still honorable at `now`
    ///
    /// Strict boundary: a token whose `expires_at` equals `now` is expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    /// Stores a freshly minted refresh token for a user
    pub async fn create(pool: &PgPool, user_id: Uuid, token: &str) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);

        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token, user_id, expires_at, revoked_at, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Looks up a stored token by its value
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, token, user_id, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Revokes a stored token (rotation)
    pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every stored token for a user (logout)
    ///
    /// Idempotent: succeeds whether or not any records exist.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            token: "tok".to_string(),
            user_id: Uuid::new_v4(),
            expires_at,
            revoked_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unrevoked_future_token_is_valid() {
        let now = Utc::now();
        assert!(record(now + Duration::hours(1), None).is_valid(now));
    }

    #[test]
    fn test_expiry_boundary_is_strict() {
        let now = Utc::now();
        assert!(!record(now, None).is_valid(now));
        assert!(!record(now - Duration::seconds(1), None).is_valid(now));
    }

    #[test]
    fn test_revoked_token_is_invalid() {
        let now = Utc::now();
        assert!(!record(now + Duration::hours(1), Some(now)).is_valid(now));
    }
}
