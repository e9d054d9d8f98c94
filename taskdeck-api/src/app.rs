/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware. Authentication happens once in [`jwt_auth_layer`],
/// which validates the bearer access token and stores an `AuthContext` in
/// the request extensions; role requirements are declared per route group
/// with `require_roles`.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::{AppState, build_router}, config::Config};
/// use taskdeck_shared::email::SmtpNotifier;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let notifier = Arc::new(SmtpNotifier::new(&config.smtp())?);
/// let state = AppState::new(pool, config, notifier);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::{
    auth::{
        jwt,
        middleware::{bearer_token, require_roles, AuthContext},
    },
    email::Notifier,
    models::user::OrgRole,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; cheap to
/// clone (pool handle plus two Arcs).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email notifier; tests substitute a recording fake
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            notifier,
        }
    }

    /// Access-token signing secret
    pub fn access_secret(&self) -> &str {
        &self.config.jwt.access_secret
    }

    /// Refresh-token signing secret
    pub fn refresh_secret(&self) -> &str {
        &self.config.jwt.refresh_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/
///     ├── /auth/                    # Registration, login, tokens, recovery
///     │   ├── POST /register /login /refresh
///     │   ├── POST /logout          # authenticated
///     │   ├── GET  /verify
///     │   ├── POST /resend-verification /forgot-password /reset-password
///     │   └── GET  /google /google/callback /github /github/callback
///     ├── /organizations/           # create/read/update/leave/delete
///     ├── /users/                   # org member administration
///     ├── /projects/                # project CRUD + progress
///     ├── /tasks/                   # task CRUD
///     └── /comments/                # comments on tasks
/// ```
///
/// Role gates (applied as `require_roles` layers; handlers add finer checks
/// such as "project manager or admin"):
///
/// | group                          | roles            |
/// |--------------------------------|------------------|
/// | POST /users/invite, role/remove| ADMIN            |
/// | GET /users                     | ADMIN, MANAGER   |
/// | POST /projects                 | ADMIN, MANAGER   |
/// | POST/PATCH /tasks              | ADMIN, MANAGER   |
/// | DELETE /tasks/:id              | ADMIN            |
/// | PATCH/DELETE /organizations/me | ADMIN            |
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Role sets for the route-to-roles map below
    const ADMIN_ONLY: &[OrgRole] = &[OrgRole::Admin];
    const MANAGER_UP: &[OrgRole] = &[OrgRole::Admin, OrgRole::Manager];

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public except logout, which needs a subject to log out)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route(
            "/logout",
            post(routes::auth::logout).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_layer,
            )),
        )
        .route("/verify", get(routes::auth::verify))
        .route(
            "/resend-verification",
            post(routes::auth::resend_verification),
        )
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/google", get(routes::oauth::google_authorize))
        .route("/google/callback", get(routes::oauth::google_callback))
        .route("/github", get(routes::oauth::github_authorize))
        .route("/github/callback", get(routes::oauth::github_callback));

    // Organization routes: admin-gated management plus member-level reads
    let org_routes = Router::new()
        .route(
            "/",
            post(routes::organizations::create).get(routes::organizations::list),
        )
        .route(
            "/me",
            get(routes::organizations::my_org).merge(
                patch(routes::organizations::update_my_org)
                    .delete(routes::organizations::delete_my_org)
                    .layer(axum::middleware::from_fn(require_roles(ADMIN_ONLY))),
            ),
        )
        .route("/leave", post(routes::organizations::leave))
        .route("/:id", get(routes::organizations::get_by_id))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // User administration within an organization
    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list)
                .layer(axum::middleware::from_fn(require_roles(MANAGER_UP))),
        )
        .route(
            "/invite",
            post(routes::users::invite)
                .layer(axum::middleware::from_fn(require_roles(ADMIN_ONLY))),
        )
        .route(
            "/:id/role",
            patch(routes::users::update_role)
                .layer(axum::middleware::from_fn(require_roles(ADMIN_ONLY))),
        )
        .route(
            "/:id",
            delete(routes::users::remove)
                .layer(axum::middleware::from_fn(require_roles(ADMIN_ONLY))),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Projects: creation is manager-level; update/delete add a
    // manager-of-this-project check inside the handlers
    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list).merge(
                post(routes::projects::create)
                    .layer(axum::middleware::from_fn(require_roles(MANAGER_UP))),
            ),
        )
        .route(
            "/:id",
            get(routes::projects::get)
                .patch(routes::projects::update)
                .delete(routes::projects::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Tasks
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list).merge(
                post(routes::tasks::create)
                    .layer(axum::middleware::from_fn(require_roles(MANAGER_UP))),
            ),
        )
        .route(
            "/:id",
            get(routes::tasks::get)
                .merge(
                    patch(routes::tasks::update)
                        .layer(axum::middleware::from_fn(require_roles(MANAGER_UP))),
                )
                .merge(
                    delete(routes::tasks::remove)
                        .layer(axum::middleware::from_fn(require_roles(ADMIN_ONLY))),
                ),
        )
        .route("/:id/comments", get(routes::comments::list_for_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Comments: any member creates; deletion is author-or-admin (handler)
    let comment_routes = Router::new()
        .route("/", post(routes::comments::create))
        .route("/:id", delete(routes::comments::remove))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/organizations", org_routes)
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes);

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer access token, then injects an
/// `AuthContext` into the request extensions for downstream layers and
/// handlers.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = bearer_token(&req)?;

    let claims = jwt::validate_access_token(token, state.access_secret())?;

    let auth_context = AuthContext::from_claims(&claims);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
