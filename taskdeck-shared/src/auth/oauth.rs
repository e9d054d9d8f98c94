/// OAuth identity providers
///
/// TaskDeck supports a small closed set of OAuth providers. Each provider
/// knows its endpoints and how to extract a canonical profile from the raw
/// user-info JSON the provider returns; everything downstream (the identity
/// resolver) is provider-agnostic beyond [`OAuthProfile`].
///
/// The HTTP legs of the flow (authorize redirect, code exchange, user-info
/// fetch) live in the API crate; this module is pure and testable.

use serde::{Deserialize, Serialize};

/// Error type for OAuth profile extraction
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Provider profile carried no email address
    #[error("No email found in OAuth profile. Ensure your OAuth provider is configured to provide email access.")]
    MissingEmail,
}

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

/// Canonical identity assertion extracted from a provider profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    /// Verified email address, used as the account key
    pub email: String,

    /// Display name, best-effort
    pub display_name: String,
}

impl OAuthProvider {
    /// Provider name as used in routes and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }

    /// Authorization endpoint for the redirect leg
    pub fn authorize_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::Github => "https://github.com/login/oauth/authorize",
        }
    }

    /// Token endpoint for the code-exchange leg
    pub fn token_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::Github => "https://github.com/login/oauth/access_token",
        }
    }

    /// User-info endpoint queried with the provider access token
    pub fn userinfo_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
            OAuthProvider::Github => "https://api.github.com/user",
        }
    }

    /// Scopes requested during authorization
    pub fn scopes(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "openid email profile",
            OAuthProvider::Github => "user:email",
        }
    }

    /// Extracts a canonical profile from the provider's raw user-info JSON
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::MissingEmail` when the profile carries no email
    /// (e.g., a GitHub account with a private email and no `user:email`
    /// grant) - the login is rejected upstream with `Unauthorized`.
    ///
    /// # Example
    ///
    /// ```
    /// use taskdeck_shared::auth::oauth::OAuthProvider;
    /// use serde_json::json;
    ///
    /// let raw = json!({ "email": "a@x.com", "name": "Alice" });
    /// let profile = OAuthProvider::Google.extract_profile(&raw).unwrap();
    /// assert_eq!(profile.email, "a@x.com");
    /// ```
    pub fn extract_profile(
        &self,
        raw: &serde_json::Value,
    ) -> Result<OAuthProfile, OAuthError> {
        let email = raw
            .get("email")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or(OAuthError::MissingEmail)?
            .to_string();

        let display_name = raw
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            // GitHub profiles without a display name still carry a login
            .or_else(|| raw.get("login").and_then(|v| v.as_str()))
            .unwrap_or("OAuth User")
            .to_string();

        Ok(OAuthProfile {
            email,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_google_profile() {
        let raw = json!({ "email": "alice@example.com", "name": "Alice", "picture": "x" });
        let profile = OAuthProvider::Google.extract_profile(&raw).unwrap();

        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.display_name, "Alice");
    }

    #[test]
    fn test_github_profile_falls_back_to_login() {
        let raw = json!({ "email": "bob@example.com", "name": null, "login": "bob42" });
        let profile = OAuthProvider::Github.extract_profile(&raw).unwrap();

        assert_eq!(profile.display_name, "bob42");
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let raw = json!({ "name": "No Email", "login": "noemail" });
        assert!(matches!(
            OAuthProvider::Github.extract_profile(&raw),
            Err(OAuthError::MissingEmail)
        ));

        let empty = json!({ "email": "", "name": "Empty" });
        assert!(OAuthProvider::Google.extract_profile(&empty).is_err());
    }

    #[test]
    fn test_default_display_name() {
        let raw = json!({ "email": "x@y.com" });
        let profile = OAuthProvider::Google.extract_profile(&raw).unwrap();
        assert_eq!(profile.display_name, "OAuth User");
    }
}
