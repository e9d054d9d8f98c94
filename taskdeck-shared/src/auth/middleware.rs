/// Authentication middleware pieces for Axum
///
/// The API server validates the bearer token once per request and stores an
/// [`AuthContext`] in the request extensions; downstream layers and handlers
/// read it from there. Role requirements are declared per route group with
/// [`require_roles`], which is the declarative route-to-role-set map the
/// authorization engine consults at dispatch time.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskdeck_shared::auth::middleware::{require_roles, AuthContext};
/// use taskdeck_shared::models::user::OrgRole;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let admin_routes: Router = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn(require_roles(&[OrgRole::Admin])));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::authorization::check_org_role;
use super::jwt::Claims;
use crate::models::user::{OrgRole, SystemRole};

/// Authenticated subject, derived from validated access-token claims
///
/// Added to request extensions after authentication; handlers extract it
/// with Axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Organization the user belongs to, if any
    pub org_id: Option<Uuid>,

    /// Organization-scoped role, present only while `org_id` is set
    pub role: Option<OrgRole>,

    /// System-wide role
    pub system_role: SystemRole,
}

impl AuthContext {
    /// Builds an auth context from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            org_id: claims.org_id,
            role: claims.role,
            system_role: claims.system_role,
        }
    }
}

/// Error type for the authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing Authorization header
    MissingCredentials,

    /// Authorization header is not a Bearer token
    InvalidFormat(String),

    /// Token validation failed (bad signature, expired, wrong type)
    InvalidToken(String),

    /// Authenticated but role evaluation failed
    Forbidden(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing credentials".to_string(),
            ),
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Extracts the bearer token from a request's Authorization header
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` when the header is absent and
/// `AuthError::InvalidFormat` when it is not a `Bearer` scheme.
pub fn bearer_token(req: &Request) -> Result<&str, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Creates a role-requirement middleware for a route group
///
/// The subject must already be authenticated (an upstream layer inserted the
/// `AuthContext`); absence of one is reported as `Unauthorized` before any
/// role evaluation.
pub fn require_roles(
    required: &'static [OrgRole],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    move |req, next| {
        Box::pin(async move {
            let auth = req
                .extensions()
                .get::<AuthContext>()
                .copied()
                .ok_or(AuthError::MissingCredentials)?;

            check_org_role(&auth, required).map_err(|e| AuthError::Forbidden(e.to_string()))?;

            Ok(next.run(req).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let claims = Claims::new(
            user_id,
            Some(org_id),
            Some(OrgRole::Admin),
            SystemRole::User,
            TokenType::Access,
        );

        let context = AuthContext::from_claims(&claims);

        assert_eq!(context.user_id, user_id);
        assert_eq!(context.org_id, Some(org_id));
        assert_eq!(context.role, Some(OrgRole::Admin));
        assert_eq!(context.system_role, SystemRole::User);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = Request::builder()
            .header("authorization", "Bearer abc123")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).unwrap(), "abc123");

        let missing = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert!(matches!(
            bearer_token(&missing),
            Err(AuthError::MissingCredentials)
        ));

        let basic = Request::builder()
            .header("authorization", "Basic abc123")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(matches!(
            bearer_token(&basic),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AuthError::Forbidden("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
