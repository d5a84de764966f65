/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_api::{app::AppState, config::Config};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamboard_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = teamboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use teamboard_shared::{
    auth::middleware::authenticate_bearer,
    store::{CascadePolicy, Store},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Storage backend as a trait object for the ledgers
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Policy for project deletion
    pub fn cascade(&self) -> CascadePolicy {
        self.config.cascade_policy()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                        (public)
/// ├── /auth/                              (public)
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── POST /refresh
/// ├── /users/                             (JWT)
/// │   ├── GET    /
/// │   └── GET|PUT|DELETE /:id
/// ├── /projects/                          (JWT)
/// │   ├── POST|GET /
/// │   ├── GET|PUT|DELETE /:id
/// │   └── GET /status/:status
/// ├── /project-users/                     (JWT)
/// │   ├── POST /
/// │   ├── GET  /project/:project_id
/// │   ├── GET  /user/:user_id
/// │   ├── GET  /team-members/:user_id
/// │   ├── PUT  /:id/role
/// │   ├── DELETE /project/:project_id/user/:user_id
/// │   └── GET  /project/:project_id/user/:user_id/check
/// └── /tasks/                             (JWT)
///     ├── POST|GET /
///     ├── GET|PUT|DELETE /:id
///     ├── POST /:id/messages
///     ├── GET  /project/:project_id
///     └── GET  /project/:status/:project_id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, health, project_users, projects, tasks, users};

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    let project_routes = Router::new()
        .route("/", post(projects::create_project).get(projects::list_projects))
        .route("/status/:status", get(projects::list_projects_by_status))
        .route(
            "/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        );

    let membership_routes = Router::new()
        .route("/", post(project_users::add_member))
        .route("/:id/role", put(project_users::update_role))
        .route("/project/:project_id", get(project_users::list_members))
        .route(
            "/project/:project_id/user/:user_id",
            axum::routing::delete(project_users::remove_member),
        )
        .route(
            "/project/:project_id/user/:user_id/check",
            get(project_users::check_membership),
        )
        .route("/user/:user_id", get(project_users::list_user_projects))
        .route("/team-members/:user_id", get(project_users::list_team_members));

    // The router needs one parameter name per segment position, so both
    // project listings call their third segment `selector`
    let task_routes = Router::new()
        .route("/", post(tasks::create_task).get(tasks::list_tasks))
        .route(
            "/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/:id/messages", post(tasks::post_message))
        .route("/project/:selector", get(tasks::list_project_tasks))
        .route(
            "/project/:selector/:project_id",
            get(tasks::list_project_tasks_by_status),
        );

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/project-users", membership_routes)
        .nest("/tasks", task_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .merge(protected_routes)
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
/// Validates the bearer token and injects `AuthContext` into request
/// extensions, where handlers pick it up as an extractor.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth = authenticate_bearer(header, state.jwt_secret())?;
    tracing::debug!(user_id = %auth.user_id, "Request authenticated");

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
