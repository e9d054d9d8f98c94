/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe struct,
/// validated at startup. Secrets are never read from anywhere but the
/// environment.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PUBLIC_URL`: Public base URL of this API, used for OAuth callbacks
///   (default: http://localhost:8080)
/// - `JWT_ACCESS_SECRET`: Access-token signing secret, >= 32 chars (required)
/// - `JWT_REFRESH_SECRET`: Refresh-token signing secret, >= 32 chars,
///   distinct from the access secret (required)
/// - `FRONTEND_URL`: Base URL for links embedded in emails (required)
/// - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` /
///   `SMTP_FROM`: outbound email relay (required)
/// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`: Google OAuth (optional)
/// - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`: GitHub OAuth (optional)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use taskdeck_shared::email::SmtpConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outbound email configuration
    pub email: EmailConfig,

    /// OAuth provider credentials
    pub oauth: OAuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Public base URL of this API (OAuth callback construction)
    pub public_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
///
/// Access and refresh tokens are signed with distinct secrets so a leaked
/// access secret cannot forge refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Access-token signing secret
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub access_secret: String,

    /// Refresh-token signing secret, distinct from `access_secret`
    pub refresh_secret: String,
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,

    /// SMTP port
    pub smtp_port: u16,

    /// SMTP username
    pub smtp_username: String,

    /// SMTP password
    pub smtp_password: String,

    /// From header for all outbound mail
    pub from: String,

    /// Base URL for links embedded in emails
    pub frontend_url: String,
}

/// OAuth provider credentials; a provider with no credentials is disabled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Google OAuth application
    pub google: Option<OAuthClient>,

    /// GitHub OAuth application
    pub github: Option<OAuthClient>,
}

/// Credentials for one OAuth application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing, secrets are too
    /// short, or the two JWT secrets are identical.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let public_url =
            env::var("API_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let access_secret = env::var("JWT_ACCESS_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_ACCESS_SECRET environment variable is required"))?;
        let refresh_secret = env::var("JWT_REFRESH_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_REFRESH_SECRET environment variable is required"))?;

        if access_secret.len() < 32 {
            anyhow::bail!("JWT_ACCESS_SECRET must be at least 32 characters long");
        }
        if refresh_secret.len() < 32 {
            anyhow::bail!("JWT_REFRESH_SECRET must be at least 32 characters long");
        }
        if access_secret == refresh_secret {
            anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| anyhow::anyhow!("SMTP_HOST environment variable is required"))?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()?;
        let smtp_username = env::var("SMTP_USERNAME")
            .map_err(|_| anyhow::anyhow!("SMTP_USERNAME environment variable is required"))?;
        let smtp_password = env::var("SMTP_PASSWORD")
            .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD environment variable is required"))?;
        let smtp_from = env::var("SMTP_FROM")
            .map_err(|_| anyhow::anyhow!("SMTP_FROM environment variable is required"))?;
        let frontend_url = env::var("FRONTEND_URL")
            .map_err(|_| anyhow::anyhow!("FRONTEND_URL environment variable is required"))?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                public_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
            },
            email: EmailConfig {
                smtp_host,
                smtp_port,
                smtp_username,
                smtp_password,
                from: smtp_from,
                frontend_url,
            },
            oauth: OAuthConfig {
                google: oauth_client_from_env("GOOGLE"),
                github: oauth_client_from_env("GITHUB"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// SMTP settings in the shape the notifier expects
    pub fn smtp(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.email.smtp_host.clone(),
            port: self.email.smtp_port,
            username: self.email.smtp_username.clone(),
            password: self.email.smtp_password.clone(),
            from: self.email.from.clone(),
            frontend_url: self.email.frontend_url.clone(),
        }
    }
}

fn oauth_client_from_env(prefix: &str) -> Option<OAuthClient> {
    let client_id = env::var(format!("{prefix}_CLIENT_ID")).ok()?;
    let client_secret = env::var(format!("{prefix}_CLIENT_SECRET")).ok()?;

    Some(OAuthClient {
        client_id,
        client_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                access_secret: "test-access-secret-at-least-32-bytes!!".to_string(),
                refresh_secret: "test-refresh-secret-at-least-32-bytes!".to_string(),
            },
            email: EmailConfig {
                smtp_host: "smtp.example.com".to_string(),
                smtp_port: 587,
                smtp_username: "mailer".to_string(),
                smtp_password: "secret".to_string(),
                from: "TaskDeck <no-reply@taskdeck.io>".to_string(),
                frontend_url: "http://localhost:3000".to_string(),
            },
            oauth: OAuthConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(sample_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_smtp_config_shape() {
        let smtp = sample_config().smtp();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.frontend_url, "http://localhost:3000");
    }
}
