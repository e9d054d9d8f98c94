/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access/refresh token generation and validation (distinct secrets)
/// - [`one_time`]: Single-use verification/reset tokens with 10-minute expiry
/// - [`oauth`]: OAuth provider variants and profile extraction
/// - [`authorization`]: Two-dimensional role evaluation
/// - [`middleware`]: Axum auth context and role-requirement layers
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::auth::password::{hash_password, verify_password};
/// use taskdeck_shared::auth::jwt::issue_token_pair;
/// use taskdeck_shared::models::user::SystemRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let pair = issue_token_pair(
///     Uuid::new_v4(),
///     None,
///     None,
///     SystemRole::User,
///     "access-secret",
///     "refresh-secret",
/// )?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod one_time;
pub mod password;
