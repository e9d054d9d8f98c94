/// Member administration endpoints
///
/// All operations are scoped to the caller's organization.
///
/// # Endpoints
///
/// - `POST   /v1/users/invite` - Invite a user into the organization (ADMIN)
/// - `GET    /v1/users` - List members (ADMIN, MANAGER)
/// - `PATCH  /v1/users/:id/role` - Change a member's role (ADMIN)
/// - `DELETE /v1/users/:id` - Remove a member, soft delete (ADMIN)

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
    auth::{authorization::require_organization, middleware::AuthContext, one_time, password},
    email::spawn_detached,
    models::{
        organization::Organization,
        user::{CreateUser, OrgRole, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    /// Email of the invitee
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name for a newly created account
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    /// Role the invitee joins with
    pub role: OrgRole,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New organization role
    pub role: OrgRole,
}

/// Invites a user into the caller's organization (ADMIN)
///
/// An existing organization-less account is attached with the invited role.
/// An unknown email gets a fresh account, pre-verified, with a reset token
/// so the invitee chooses their own password through the invite email.
///
/// # Errors
///
/// - `409 Conflict`: The user already belongs to an organization, or the
///   email belongs to a removed account
pub async fn invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    let org_id = require_organization(&auth)?;

    let org = Organization::find_by_id(&state.db, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(existing) if existing.is_deleted() => {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
        Some(existing) if existing.organization_id.is_some() => {
            return Err(ApiError::Conflict(
                "User already belongs to an organization".to_string(),
            ));
        }
        Some(existing) => {
            let attached =
                User::attach_to_org(&state.db, existing.id, org_id, req.role).await?;
            if !attached {
                // Lost the race with a concurrent invite
                return Err(ApiError::Conflict(
                    "User already belongs to an organization".to_string(),
                ));
            }

            User::find_by_id(&state.db, existing.id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
        }
        None => {
            let password_hash = password::hash_password(&password::generate_throwaway_password())?;
            let (reset_token, expires_at) = one_time::generate();

            let name = req.name.clone().unwrap_or_else(|| {
                req.email
                    .split('@')
                    .next()
                    .unwrap_or("Invited User")
                    .to_string()
            });

            let user = User::create(
                &state.db,
                CreateUser {
                    name,
                    email: req.email.clone(),
                    password_hash,
                    verified: true,
                    reset_token: Some(reset_token.clone()),
                    reset_token_expires_at: Some(expires_at),
                    organization_id: Some(org_id),
                    role: Some(req.role),
                    ..Default::default()
                },
            )
            .await?;

            let notifier = state.notifier.clone();
            let email = user.email.clone();
            let org_name = org.name.clone();
            let role = req.role.as_str();
            spawn_detached("account invite email", async move {
                notifier
                    .send_account_invite_email(&email, &reset_token, &org_name, role)
                    .await
            });

            user
        }
    };

    Ok(Json(user))
}

/// Lists active members of the caller's organization (ADMIN, MANAGER)
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    let org_id = require_organization(&auth)?;

    let users = User::list_in_org(&state.db, org_id).await?;

    Ok(Json(users))
}

/// Changes a member's organization role (ADMIN)
///
/// # Errors
///
/// - `400 Bad Request`: Changing your own role
/// - `404 Not Found`: No such active member in this organization
pub async fn update_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    let org_id = require_organization(&auth)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot change your own role".to_string(),
        ));
    }

    let user = User::update_role_in_org(&state.db, id, org_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Soft-removes a member from the caller's organization (ADMIN)
///
/// # Errors
///
/// - `400 Bad Request`: Removing yourself
/// - `404 Not Found`: No such active member in this organization
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let org_id = require_organization(&auth)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot remove yourself".to_string(),
        ));
    }

    let removed = User::soft_delete_in_org(&state.db, id, org_id).await?;
    if !removed {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "User removed from organization".to_string(),
    }))
}
