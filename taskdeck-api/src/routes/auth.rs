/// Authentication endpoints
///
/// Registration, login, token lifecycle, and the verification / password
/// recovery workflows.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user (sends verification email)
/// - `POST /v1/auth/login` - Login and get a token pair
/// - `POST /v1/auth/refresh` - Rotate a refresh token
/// - `POST /v1/auth/logout` - Revoke all refresh tokens (authenticated)
/// - `GET  /v1/auth/verify` - Consume a verification token
/// - `POST /v1/auth/resend-verification` - Re-send the verification email
/// - `POST /v1/auth/forgot-password` - Start password recovery
/// - `POST /v1/auth/reset-password` - Consume a reset token
///
/// Account-enumeration guard: `resend-verification` and `forgot-password`
/// return the same generic message whether or not the account exists, and
/// login failures never distinguish unknown, soft-deleted, and
/// wrong-password accounts.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{jwt, middleware::AuthContext, one_time, password},
    email::spawn_detached,
    models::{
        refresh_token::RefreshToken,
        user::{CreateUser, User},
    },
};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const GENERIC_RECOVERY_MESSAGE: &str =
    "If an account with that email exists, an email has been sent";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Token pair response (login, refresh, OAuth callback)
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (15 minutes)
    pub access_token: String,

    /// Refresh token (7 days)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token to rotate
    pub refresh_token: String,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Verification query parameters, both carried by the emailed link
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    /// Account being verified
    pub email: String,

    /// Verification token from the emailed link
    pub token: String,
}

/// Email-only request (resend verification, forgot password)
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Reset token from the emailed link
    pub token: String,

    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register a new user
///
/// Creates an unverified account and sends a verification email. The email
/// send is best-effort: a relay failure is logged and the registration still
/// succeeds, since `resend-verification` covers recovery.
///
/// # Errors
///
/// - `409 Conflict`: Email already in use (soft-deleted accounts included)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    // Soft-deleted accounts keep their email reserved
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let (token, expires_at) = one_time::generate();

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            verified: false,
            verification_token: Some(token.clone()),
            verification_token_expires_at: Some(expires_at),
            ..Default::default()
        },
    )
    .await?;

    let notifier = state.notifier.clone();
    let email = user.email.clone();
    spawn_detached("registration verification email", async move {
        notifier.send_verification_email(&email, &token).await
    });

    Ok(Json(MessageResponse {
        message: "Registration successful. Please check your email to verify your account"
            .to_string(),
    }))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email, soft-deleted account, or wrong
///   password (one shared message), or unverified email (distinct message)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !user.verified {
        return Err(ApiError::Unauthorized(
            "Please verify your email before logging in".to_string(),
        ));
    }

    let pair = jwt::issue_token_pair(
        user.id,
        user.organization_id,
        user.org_role(),
        user.system_role,
        state.access_secret(),
        state.refresh_secret(),
    )?;

    RefreshToken::create(&state.db, user.id, &pair.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Token rotation endpoint
///
/// The presented refresh token must be cryptographically valid AND still
/// stored, unrevoked, and unexpired. Rotation revokes it before minting a
/// new pair, so a replayed token fails. Claims are rebuilt from the current
/// user row, picking up role and organization changes.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, revoked, expired, or unknown token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.refresh_secret())?;

    let record = RefreshToken::find_by_token(&state.db, &req.refresh_token)
        .await?
        .filter(|r| r.is_valid(Utc::now()))
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    // Revoke-on-rotate: the presented token is spent
    RefreshToken::revoke(&state.db, record.id).await?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let pair = jwt::issue_token_pair(
        user.id,
        user.organization_id,
        user.org_role(),
        user.system_role,
        state.access_secret(),
        state.refresh_secret(),
    )?;

    RefreshToken::create(&state.db, user.id, &pair.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Logout endpoint
///
/// Deletes every stored refresh token for the authenticated user.
/// Idempotent: logging out twice succeeds both times.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    RefreshToken::delete_all_for_user(&state.db, auth.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Email verification endpoint
///
/// Looks the account up by email, so re-clicking a consumed link (whose
/// token `mark_verified` already cleared) is a no-op success instead of an
/// error.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown account, wrong token, or expired token
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_by_email(&state.db, &params.email)
        .await?
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| ApiError::BadRequest("Invalid verification token".to_string()))?;

    // Re-clicking an old link after verification is a no-op success
    if user.verified {
        return Ok(Json(MessageResponse {
            message: "Email already verified".to_string(),
        }));
    }

    if user.verification_token.as_deref() != Some(params.token.as_str()) {
        return Err(ApiError::BadRequest(
            "Invalid verification token".to_string(),
        ));
    }

    if one_time::is_expired(user.verification_token_expires_at) {
        return Err(ApiError::BadRequest(
            "Verification token has expired".to_string(),
        ));
    }

    User::mark_verified(&state.db, user.id).await?;

    let notifier = state.notifier.clone();
    let email = user.email.clone();
    let name = user.name.clone();
    spawn_detached("post-verification welcome email", async move {
        notifier.send_welcome_email(&email, &name).await
    });

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

/// Re-sends the verification email
///
/// Always returns the same generic message; a fresh token (overwriting the
/// prior one) is only minted when the account exists and is unverified.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .filter(|u| !u.is_deleted() && !u.verified);

    if let Some(user) = user {
        let (token, expires_at) = one_time::generate();
        User::set_verification_token(&state.db, user.id, &token, expires_at).await?;

        let notifier = state.notifier.clone();
        let email = user.email.clone();
        spawn_detached("resent verification email", async move {
            notifier.send_verification_email(&email, &token).await
        });
    }

    Ok(Json(MessageResponse {
        message: GENERIC_RECOVERY_MESSAGE.to_string(),
    }))
}

/// Starts password recovery
///
/// Always returns the same generic message; the reset token is only minted
/// for an existing active account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .filter(|u| !u.is_deleted());

    if let Some(user) = user {
        let (token, expires_at) = one_time::generate();
        User::set_reset_token(&state.db, user.id, &token, expires_at).await?;

        let notifier = state.notifier.clone();
        let email = user.email.clone();
        spawn_detached("password reset email", async move {
            notifier.send_password_reset_email(&email, &token).await
        });
    }

    Ok(Json(MessageResponse {
        message: GENERIC_RECOVERY_MESSAGE.to_string(),
    }))
}

/// Consumes a reset token and replaces the password
///
/// Lookup is by token value alone; unknown and expired tokens share one
/// message so the endpoint leaks nothing about which tokens ever existed.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid or expired reset token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let user = User::find_by_reset_token(&state.db, &req.token)
        .await?
        .filter(|u| !one_time::is_expired(u.reset_token_expires_at))
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".to_string()))?;

    let password_hash = password::hash_password(&req.password)?;
    User::update_password(&state.db, user.id, &password_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}
