/// Common test utilities for integration tests
///
/// Shared infrastructure for DB-backed integration tests:
/// - Test database setup (migrations against `DATABASE_URL`)
/// - A recording notifier so no test ever talks SMTP
/// - User/organization fixtures and JWT helpers
/// - Request helpers for exercising the router

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::{ApiConfig, Config, DatabaseConfig, EmailConfig, JwtConfig, OAuthConfig};
use taskdeck_shared::auth::jwt;
use taskdeck_shared::email::{EmailError, Notifier};
use taskdeck_shared::models::user::{CreateUser, OrgRole, SystemRole, User};
use tower::Service as _;
use uuid::Uuid;

pub const ACCESS_SECRET: &str = "test-access-secret-at-least-32-bytes!!";
pub const REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-bytes!";

/// Notifier that records sends instead of talking SMTP
#[derive(Default)]
pub struct RecordingNotifier {
    /// (kind, recipient) pairs in send order
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn record(&self, kind: &str, email: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((kind.to_string(), email.to_string()));
    }

    /// Recipients of all sends of one kind
    pub fn recipients_of(&self, kind: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
        self.record("verification", email);
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
        self.record("password_reset", email);
        Ok(())
    }

    async fn send_welcome_email(&self, email: &str, _: &str) -> Result<(), EmailError> {
        self.record("welcome", email);
        Ok(())
    }

    async fn send_organization_deleted_email(
        &self,
        email: &str,
        _: &str,
    ) -> Result<(), EmailError> {
        self.record("organization_deleted", email);
        Ok(())
    }

    async fn send_account_invite_email(
        &self,
        email: &str,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<(), EmailError> {
        self.record("account_invite", email);
        Ok(())
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    /// Creates a test context against the `DATABASE_URL` database
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")?;
        let db = PgPool::connect(&database_url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                access_secret: ACCESS_SECRET.to_string(),
                refresh_secret: REFRESH_SECRET.to_string(),
            },
            email: EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 587,
                smtp_username: "test".to_string(),
                smtp_password: "test".to_string(),
                from: "TaskDeck <test@taskdeck.test>".to_string(),
                frontend_url: "http://localhost:3000".to_string(),
            },
            oauth: OAuthConfig::default(),
        };

        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(db.clone(), config, notifier.clone());
        let app = build_router(state);

        Ok(TestContext { db, app, notifier })
    }

    /// Creates a verified user with no organization
    pub async fn create_user(&self, password_hash: &str) -> anyhow::Result<User> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: "Test User".to_string(),
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: password_hash.to_string(),
                verified: true,
                ..Default::default()
            },
        )
        .await?;

        Ok(user)
    }

    /// Creates a verified user attached to an organization
    pub async fn create_member(&self, org_id: Uuid, role: OrgRole) -> anyhow::Result<User> {
        let user = self.create_user("unused-hash").await?;
        User::attach_to_org(&self.db, user.id, org_id, role).await?;

        let user = User::find_by_id(&self.db, user.id)
            .await?
            .expect("member just created");
        Ok(user)
    }

    /// Issues an access token reflecting the user's current row
    pub fn access_token(&self, user: &User) -> String {
        let pair = jwt::issue_token_pair(
            user.id,
            user.organization_id,
            user.org_role(),
            user.system_role,
            ACCESS_SECRET,
            REFRESH_SECRET,
        )
        .expect("token pair");

        pair.access_token
    }

    /// Issues an access token for a super admin subject without an org
    pub fn super_admin_token(&self, user_id: Uuid) -> String {
        let pair = jwt::issue_token_pair(
            user_id,
            None,
            None,
            SystemRole::SuperAdmin,
            ACCESS_SECRET,
            REFRESH_SECRET,
        )
        .expect("token pair");

        pair.access_token
    }

    /// Sends a JSON request through the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }
}

/// Unique organization name for a test
pub fn unique_org_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}
