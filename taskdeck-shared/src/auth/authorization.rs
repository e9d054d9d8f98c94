/// Authorization engine: two-dimensional role checks
///
/// TaskDeck authorizes requests along two axes:
///
/// 1. **System role** (`SUPER_ADMIN` | `USER`) - system-wide
/// 2. **Organization role** (`ADMIN` | `MANAGER` | `MEMBER`) - scoped to the
///    subject's single organization, absent when they have none
///
/// Evaluation order for an operation that declares a required-role set:
///
/// 1. No authenticated subject at all fails upstream (middleware) with
///    `Unauthorized`, before any role evaluation.
/// 2. A `SUPER_ADMIN` with no organization context bypasses the check
///    entirely. A super admin who *has* joined an organization is held to
///    that organization's role like anyone else.
/// 3. Otherwise the subject's organization role must be a member of the
///    declared set; the failure message enumerates the accepted roles and
///    the subject's actual role for diagnostics.
/// 4. Operations that declare no role set accept any authenticated subject.
///
/// Tenant ownership is enforced separately by the models: every lookup is
/// keyed by `(id, org_id)` and filters `deleted_at IS NULL`, so cross-tenant
/// references surface as `NotFound`, never `Forbidden`.

use super::middleware::AuthContext;
use crate::models::user::{OrgRole, SystemRole};
use uuid::Uuid;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Subject's organization role is not in the required set
    #[error("You need one of the following roles: {required}. Your current role is: {actual}")]
    InsufficientRole {
        /// Comma-separated accepted roles
        required: String,
        /// Subject's actual role, or "NONE"
        actual: String,
    },

    /// Operation requires an organization context the subject lacks
    #[error("You are not a member of any organization")]
    NoOrganization,

    /// Operation is restricted to super admins
    #[error("Only a super admin can perform this action")]
    NotSuperAdmin,
}

/// Checks a subject's organization role against a required-role set
///
/// An empty `required` set means "any authenticated subject" and always
/// passes (rule 4 above).
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::authorization::check_org_role;
/// use taskdeck_shared::auth::middleware::AuthContext;
/// use taskdeck_shared::models::user::{OrgRole, SystemRole};
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     org_id: Some(Uuid::new_v4()),
///     role: Some(OrgRole::Manager),
///     system_role: SystemRole::User,
/// };
///
/// assert!(check_org_role(&auth, &[OrgRole::Admin, OrgRole::Manager]).is_ok());
/// assert!(check_org_role(&auth, &[OrgRole::Admin]).is_err());
/// ```
pub fn check_org_role(auth: &AuthContext, required: &[OrgRole]) -> Result<(), AuthzError> {
    // Super admins bypass role checks only outside an organization context.
    // Inside an organization they hold an org role and are checked on it.
    if auth.system_role == SystemRole::SuperAdmin && auth.org_id.is_none() {
        return Ok(());
    }

    if required.is_empty() {
        return Ok(());
    }

    let has_role = auth.role.map_or(false, |role| required.contains(&role));

    if !has_role {
        return Err(AuthzError::InsufficientRole {
            required: required
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            actual: auth.role.map_or("NONE", |r| r.as_str()).to_string(),
        });
    }

    Ok(())
}

/// Returns the subject's organization id, or fails for org-less subjects
///
/// Tenant-scoped operations call this before touching any resource; the
/// resulting org id keys every subsequent lookup.
pub fn require_organization(auth: &AuthContext) -> Result<Uuid, AuthzError> {
    auth.org_id.ok_or(AuthzError::NoOrganization)
}

/// Restricts an operation to `SUPER_ADMIN` subjects
pub fn require_super_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.system_role != SystemRole::SuperAdmin {
        return Err(AuthzError::NotSuperAdmin);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Option<OrgRole>, system_role: SystemRole, in_org: bool) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            org_id: in_org.then(Uuid::new_v4),
            role,
            system_role,
        }
    }

    #[test]
    fn test_role_in_set_passes() {
        let auth = subject(Some(OrgRole::Admin), SystemRole::User, true);
        assert!(check_org_role(&auth, &[OrgRole::Admin]).is_ok());
        assert!(check_org_role(&auth, &[OrgRole::Admin, OrgRole::Manager]).is_ok());
    }

    #[test]
    fn test_role_outside_set_fails_with_enumerated_message() {
        let auth = subject(Some(OrgRole::Member), SystemRole::User, true);
        let err = check_org_role(&auth, &[OrgRole::Admin, OrgRole::Manager]).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("ADMIN, MANAGER"));
        assert!(msg.contains("MEMBER"));
    }

    #[test]
    fn test_missing_role_reports_none() {
        let auth = subject(None, SystemRole::User, false);
        let err = check_org_role(&auth, &[OrgRole::Admin]).unwrap_err();
        assert!(err.to_string().contains("NONE"));
    }

    #[test]
    fn test_empty_required_set_passes_anyone() {
        let auth = subject(None, SystemRole::User, false);
        assert!(check_org_role(&auth, &[]).is_ok());
    }

    #[test]
    fn test_super_admin_bypass_outside_org() {
        let auth = subject(None, SystemRole::SuperAdmin, false);
        assert!(check_org_role(&auth, &[OrgRole::Admin]).is_ok());
    }

    #[test]
    fn test_super_admin_inside_org_is_held_to_org_role() {
        let auth = subject(Some(OrgRole::Member), SystemRole::SuperAdmin, true);
        assert!(check_org_role(&auth, &[OrgRole::Admin]).is_err());
        assert!(check_org_role(&auth, &[OrgRole::Member]).is_ok());
    }

    #[test]
    fn test_require_organization() {
        let auth = subject(Some(OrgRole::Member), SystemRole::User, true);
        assert!(require_organization(&auth).is_ok());

        let orgless = subject(None, SystemRole::User, false);
        assert!(matches!(
            require_organization(&orgless),
            Err(AuthzError::NoOrganization)
        ));
    }

    #[test]
    fn test_require_super_admin() {
        let auth = subject(None, SystemRole::SuperAdmin, false);
        assert!(require_super_admin(&auth).is_ok());

        let user = subject(None, SystemRole::User, false);
        assert!(matches!(
            require_super_admin(&user),
            Err(AuthzError::NotSuperAdmin)
        ));
    }
}
