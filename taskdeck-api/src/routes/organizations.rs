/// Organization endpoints
///
/// # Endpoints
///
/// - `POST   /v1/organizations` - Create (caller must be org-less; becomes ADMIN)
/// - `GET    /v1/organizations` - List all (SUPER_ADMIN)
/// - `GET    /v1/organizations/me` - Caller's organization
/// - `PATCH  /v1/organizations/me` - Rename (ADMIN)
/// - `DELETE /v1/organizations/me` - Soft-delete cascade (ADMIN)
/// - `POST   /v1/organizations/leave` - Leave (ADMIN may not leave)
/// - `GET    /v1/organizations/:id` - By ID (SUPER_ADMIN)

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
    auth::{
        authorization::{require_organization, require_super_admin},
        middleware::AuthContext,
    },
    email::spawn_detached,
    models::{
        organization::Organization,
        user::{OrgRole, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create / rename request
#[derive(Debug, Deserialize, Validate)]
pub struct OrganizationRequest {
    /// Organization name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// Pagination parameters for the admin listing
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Page size (default 50)
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Offset (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Creates an organization with the caller as its admin
///
/// Membership is checked against the live user row inside the creation
/// transaction, not the token claims: a token minted before the caller
/// joined some organization still carries `orgId: null`, and trusting it
/// would leave behind an admin-less orphan organization.
///
/// # Errors
///
/// - `409 Conflict`: Caller already belongs to an organization, or an
///   active organization with that name exists
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<OrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;

    if auth.org_id.is_some() {
        return Err(ApiError::Conflict(
            "You already belong to an organization".to_string(),
        ));
    }

    if Organization::find_by_name(&state.db, &req.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Organization name already in use".to_string(),
        ));
    }

    let org = Organization::create_with_admin(&state.db, &req.name, auth.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("You already belong to an organization".to_string())
        })?;

    Ok(Json(org))
}

/// Returns the caller's organization
pub async fn my_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Organization>> {
    let org_id = require_organization(&auth)?;

    let org = Organization::find_by_id(&state.db, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(org))
}

/// Renames the caller's organization (ADMIN)
pub async fn update_my_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<OrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    let org = Organization::update_name(&state.db, org_id, &req.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(org))
}

/// Leaves the caller's organization
///
/// # Errors
///
/// - `403 Forbidden`: Admins cannot leave; they must delete the
///   organization or hand off the admin role first
pub async fn leave(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    require_organization(&auth)?;

    if auth.role == Some(OrgRole::Admin) {
        return Err(ApiError::Forbidden(
            "An admin cannot leave their organization".to_string(),
        ));
    }

    User::detach_from_org(&state.db, auth.user_id).await?;

    Ok(Json(MessageResponse {
        message: "You have left the organization".to_string(),
    }))
}

/// Soft-deletes the caller's organization (ADMIN)
///
/// The tombstone and member detachment happen in one transaction;
/// notification emails go out after commit, each failure logged and
/// non-fatal.
pub async fn delete_my_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    let org_id = require_organization(&auth)?;

    let (org, member_emails) = Organization::soft_delete_cascade(&state.db, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    // The tombstoned name carries the "deleted - " prefix; notify with the
    // original
    let org_name = org
        .name
        .strip_prefix("deleted - ")
        .unwrap_or(&org.name)
        .to_string();

    for email in member_emails {
        let notifier = state.notifier.clone();
        let org_name = org_name.clone();
        spawn_detached("organization deleted email", async move {
            notifier
                .send_organization_deleted_email(&email, &org_name)
                .await
        });
    }

    Ok(Json(MessageResponse {
        message: "Organization deleted".to_string(),
    }))
}

/// Lists all active organizations (SUPER_ADMIN)
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Organization>>> {
    require_super_admin(&auth)?;

    let orgs = Organization::list(&state.db, params.limit, params.offset).await?;

    Ok(Json(orgs))
}

/// Fetches any organization by ID (SUPER_ADMIN)
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    require_super_admin(&auth)?;

    let org = Organization::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(org))
}
