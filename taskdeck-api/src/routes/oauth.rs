/// OAuth login endpoints (Google, GitHub)
///
/// Two legs per provider:
/// - `GET /v1/auth/{provider}` redirects the browser to the provider's
///   authorize endpoint.
/// - `GET /v1/auth/{provider}/callback` exchanges the code for a provider
///   access token, fetches the user profile, resolves it to a TaskDeck
///   account (by email; created on first login), and returns a token pair.
///
/// Providers assert verified email ownership, so OAuth-created accounts
/// start with `verified = true` and a random throwaway password. A provider
/// profile without an email is rejected with `401 Unauthorized`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::TokenResponse,
};
use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    auth::{jwt, oauth::OAuthProvider, password},
    email::spawn_detached,
    models::{
        refresh_token::RefreshToken,
        user::{CreateUser, User},
    },
};

/// Callback query parameters
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code from the provider
    pub code: String,
}

/// `GET /v1/auth/google`
pub async fn google_authorize(State(state): State<AppState>) -> ApiResult<Redirect> {
    authorize(&state, OAuthProvider::Google)
}

/// `GET /v1/auth/google/callback`
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Json<TokenResponse>> {
    callback(&state, OAuthProvider::Google, &params.code).await
}

/// `GET /v1/auth/github`
pub async fn github_authorize(State(state): State<AppState>) -> ApiResult<Redirect> {
    authorize(&state, OAuthProvider::Github)
}

/// `GET /v1/auth/github/callback`
pub async fn github_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Json<TokenResponse>> {
    callback(&state, OAuthProvider::Github, &params.code).await
}

fn client_for<'a>(
    state: &'a AppState,
    provider: OAuthProvider,
) -> ApiResult<&'a crate::config::OAuthClient> {
    let client = match provider {
        OAuthProvider::Google => state.config.oauth.google.as_ref(),
        OAuthProvider::Github => state.config.oauth.github.as_ref(),
    };

    client.ok_or_else(|| {
        ApiError::BadRequest(format!("{} OAuth is not configured", provider.as_str()))
    })
}

fn redirect_uri(state: &AppState, provider: OAuthProvider) -> String {
    format!(
        "{}/v1/auth/{}/callback",
        state.config.api.public_url,
        provider.as_str()
    )
}

/// Builds the provider authorize redirect
fn authorize(state: &AppState, provider: OAuthProvider) -> ApiResult<Redirect> {
    let client = client_for(state, provider)?;

    let url = authorize_url(
        provider.authorize_endpoint(),
        &client.client_id,
        &redirect_uri(state, provider),
        provider.scopes(),
    )?;

    Ok(Redirect::temporary(&url))
}

/// Assembles the authorize URL, letting `Url` handle query escaping
fn authorize_url(
    endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &str,
) -> ApiResult<String> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| ApiError::InternalError(format!("Invalid authorize endpoint: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", scopes);

    Ok(url.into())
}

/// Exchanges the code, fetches the profile, and logs the account in
async fn callback(
    state: &AppState,
    provider: OAuthProvider,
    code: &str,
) -> ApiResult<Json<TokenResponse>> {
    let client = client_for(state, provider)?;

    let access_token = exchange_code(provider, client, &redirect_uri(state, provider), code).await?;
    let raw_profile = fetch_profile(provider, &access_token).await?;
    let profile = provider.extract_profile(&raw_profile)?;

    let user = match User::find_by_email(&state.db, &profile.email).await? {
        Some(user) if !user.is_deleted() => user,
        Some(_) => {
            // Soft-deleted accounts cannot come back through OAuth
            return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
        }
        None => {
            let password_hash = password::hash_password(&password::generate_throwaway_password())?;

            let user = User::create(
                &state.db,
                CreateUser {
                    name: profile.display_name.clone(),
                    email: profile.email.clone(),
                    password_hash,
                    verified: true,
                    ..Default::default()
                },
            )
            .await?;

            let notifier = state.notifier.clone();
            let email = user.email.clone();
            let name = user.name.clone();
            spawn_detached("oauth signup welcome email", async move {
                notifier.send_welcome_email(&email, &name).await
            });

            user
        }
    };

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

/// Exchanges an authorization code for a provider access token
async fn exchange_code(
    provider: OAuthProvider,
    client: &crate::config::OAuthClient,
    redirect_uri: &str,
    code: &str,
) -> ApiResult<String> {
    let response = reqwest::Client::new()
        .post(provider.token_endpoint())
        // GitHub defaults to form-encoded responses without this
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| ApiError::InternalError(format!("OAuth code exchange failed: {}", e)))?;

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ApiError::InternalError(format!("OAuth code exchange failed: {}", e)))?;

    body.get("access_token")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization code".to_string()))
}

/// Fetches the raw user-info profile with a provider access token
async fn fetch_profile(
    provider: OAuthProvider,
    access_token: &str,
) -> ApiResult<serde_json::Value> {
    let response = reqwest::Client::new()
        .get(provider.userinfo_endpoint())
        .bearer_auth(access_token)
        // GitHub's API rejects requests without a User-Agent
        .header(reqwest::header::USER_AGENT, "taskdeck")
        .send()
        .await
        .map_err(|e| ApiError::InternalError(format!("OAuth profile fetch failed: {}", e)))?;

    response
        .json()
        .await
        .map_err(|e| ApiError::InternalError(format!("OAuth profile fetch failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_escapes_query_components() {
        let url = authorize_url(
            "https://accounts.example.com/o/oauth2/auth",
            "client-123",
            "http://localhost:8080/v1/auth/google/callback",
            "openid email profile",
        )
        .unwrap();

        assert!(url.starts_with("https://accounts.example.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fv1%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid+email+profile"));
    }

    #[test]
    fn test_authorize_url_rejects_bad_endpoint() {
        assert!(authorize_url("not a url", "id", "http://cb", "email").is_err());
    }
}
