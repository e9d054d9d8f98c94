/// JWT token generation and validation
///
/// Tokens are signed with HS256 and carry the subject's identity plus its
/// full authorization context (organization and both role dimensions), so
/// the authorization engine never needs a database round trip.
///
/// # Token Types
///
/// - **Access Token**: short-lived (15 minutes), signed with the access secret
/// - **Refresh Token**: long-lived (7 days), signed with a *different* secret
///   and persisted server-side (see `models::refresh_token`) so it can be
///   revoked independently of its expiry
///
/// # Wire contract
///
/// ```json
/// { "sub": "<user id>", "orgId": null, "role": null, "systemRole": "USER" }
/// ```
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::jwt::{Claims, TokenType, create_token, validate_token};
/// use taskdeck_shared::models::user::SystemRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, None, None, SystemRole::User, TokenType::Access);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{OrgRole, SystemRole};

/// Token issuer claim value
const ISSUER: &str = "taskdeck";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (15 minutes)
    Access,

    /// Refresh token (7 days)
    Refresh,
}

impl TokenType {
    /// Gets default expiration duration for token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::minutes(15),
            TokenType::Refresh => Duration::days(7),
        }
    }
}

/// JWT claims structure
///
/// `orgId` and `role` are null for users who do not currently belong to an
/// organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Organization context, if any
    #[serde(rename = "orgId")]
    pub org_id: Option<Uuid>,

    /// Organization-scoped role, meaningful only while `org_id` is set
    pub role: Option<OrgRole>,

    /// System-wide role
    #[serde(rename = "systemRole")]
    pub system_role: SystemRole,

    /// Issuer - always "taskdeck"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token type (custom claim, keeps access/refresh tokens from being
    /// swapped even before the secret check)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with the default expiration for the token type
    pub fn new(
        user_id: Uuid,
        org_id: Option<Uuid>,
        role: Option<OrgRole>,
        system_role: SystemRole,
        token_type: TokenType,
    ) -> Self {
        Self::with_expiration(
            user_id,
            org_id,
            role,
            system_role,
            token_type,
            token_type.default_expiration(),
        )
    }

    /// Creates claims with a custom expiration (used by tests for boundary cases)
    pub fn with_expiration(
        user_id: Uuid,
        org_id: Option<Uuid>,
        role: Option<OrgRole>,
        system_role: SystemRole,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            org_id,
            role,
            system_role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            token_type,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// A freshly minted access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Access token (15 minutes)
    pub access_token: String,

    /// Refresh token (7 days); the caller must persist a matching
    /// `RefreshToken` record for revocation
    pub refresh_token: String,
}

/// Creates a JWT token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for issuer mismatches, and `JwtError::ValidationError` for everything else
/// (bad signature, malformed token, wrong secret).
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token against the access secret and checks its type
pub fn validate_access_token(token: &str, access_secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, access_secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::ValidationError(
            "Expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates a token against the refresh secret and checks its type
pub fn validate_refresh_token(token: &str, refresh_secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, refresh_secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::ValidationError(
            "Expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Issues an access/refresh token pair for a subject
///
/// The two tokens carry identical identity claims but are signed with
/// distinct secrets. The refresh token string must also be persisted by the
/// caller (a `RefreshToken` row) so logout and rotation can revoke it.
pub fn issue_token_pair(
    user_id: Uuid,
    org_id: Option<Uuid>,
    role: Option<OrgRole>,
    system_role: SystemRole,
    access_secret: &str,
    refresh_secret: &str,
) -> Result<TokenPair, JwtError> {
    let access_claims = Claims::new(user_id, org_id, role, system_role, TokenType::Access);
    let refresh_claims = Claims::new(user_id, org_id, role, system_role, TokenType::Refresh);

    Ok(TokenPair {
        access_token: create_token(&access_claims, access_secret)?,
        refresh_token: create_token(&refresh_claims, refresh_secret)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &str = "test-access-secret-at-least-32-bytes!!";
    const REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-bytes!";

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::minutes(15));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(7));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let claims = Claims::new(
            user_id,
            Some(org_id),
            Some(OrgRole::Manager),
            SystemRole::User,
            TokenType::Access,
        );

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.org_id, Some(org_id));
        assert_eq!(claims.role, Some(OrgRole::Manager));
        assert_eq!(claims.iss, "taskdeck");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wire_contract_field_names() {
        let claims = Claims::new(
            Uuid::new_v4(),
            None,
            None,
            SystemRole::SuperAdmin,
            TokenType::Access,
        );

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("orgId").is_some());
        assert_eq!(json["orgId"], serde_json::Value::Null);
        assert_eq!(json["systemRole"], "SUPER_ADMIN");
        assert_eq!(json["role"], serde_json::Value::Null);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, None, None, SystemRole::User, TokenType::Access);
        let token = create_token(&claims, ACCESS_SECRET).expect("Should create token");

        let validated = validate_token(&token, ACCESS_SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.org_id, None);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), None, None, SystemRole::User, TokenType::Access);
        let token = create_token(&claims, ACCESS_SECRET).unwrap();

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            None,
            None,
            SystemRole::User,
            TokenType::Access,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, ACCESS_SECRET).unwrap();
        let result = validate_token(&token, ACCESS_SECRET);

        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let pair = issue_token_pair(
            Uuid::new_v4(),
            None,
            None,
            SystemRole::User,
            ACCESS_SECRET,
            REFRESH_SECRET,
        )
        .unwrap();

        // Right secret, wrong type
        let refresh_as_access = validate_access_token(&pair.refresh_token, REFRESH_SECRET);
        assert!(refresh_as_access.is_err());

        // Distinct secrets: the access secret cannot validate the refresh token
        assert!(validate_refresh_token(&pair.refresh_token, ACCESS_SECRET).is_err());
        assert!(validate_refresh_token(&pair.refresh_token, REFRESH_SECRET).is_ok());
    }

    #[test]
    fn test_issue_token_pair_claims_match() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let pair = issue_token_pair(
            user_id,
            Some(org_id),
            Some(OrgRole::Admin),
            SystemRole::User,
            ACCESS_SECRET,
            REFRESH_SECRET,
        )
        .unwrap();

        let access = validate_access_token(&pair.access_token, ACCESS_SECRET).unwrap();
        let refresh = validate_refresh_token(&pair.refresh_token, REFRESH_SECRET).unwrap();

        assert_eq!(access.sub, user_id);
        assert_eq!(refresh.sub, user_id);
        assert_eq!(access.org_id, Some(org_id));
        assert_eq!(access.role, Some(OrgRole::Admin));
    }
}
