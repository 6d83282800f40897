/// Application state and router builder
///
/// Defines the shared application state and builds the axum router with
/// all routes and middleware. State is constructed once at startup and
/// handed in explicitly — the signing secret and the store handle are
/// never process-wide globals.
///
/// # Example
///
/// ```no_run
/// use sitedesk_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = sitedesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sitedesk_shared::auth::middleware::authenticate_request;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/                          # API v1 (versioned)
///     ├── /auth/
///     │   ├── POST /login           # (public)
///     │   ├── POST /register        # (admin)
///     │   └── GET  /me
///     ├── /users/                   # Account management (mutations admin-only)
///     │   └── POST /profile-image   # Avatar upload (any user)
///     ├── /tasks/                   # Task board
///     │   ├── POST /:id/take
///     │   ├── POST /:id/complete
///     │   └── POST /:id/assign      # (admin)
///     ├── /materials/               # Procurement list
///     └── /activity                 # Audit trail
/// ```
///
/// All routes except `/health` and `/v1/auth/login` require a bearer
/// token; admin-only operations are gated inside their handlers.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Login is the one public API endpoint
    let public_auth_routes = Router::new().route("/login", post(routes::auth::login));

    // /auth/register is an alias for admin user creation; both paths share
    // one handler.
    let protected_auth_routes = Router::new()
        .route("/register", post(routes::users::create_user))
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let auth_routes = public_auth_routes.merge(protected_auth_routes);

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/", post(routes::users::create_user))
        .route("/:id", put(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user))
        .route("/profile-image", post(routes::users::upload_profile_image))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/assign", post(routes::tasks::assign_task))
        .route("/:id/take", post(routes::tasks::take_task))
        .route("/:id/complete", post(routes::tasks::complete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let material_routes = Router::new()
        .route("/", get(routes::materials::list_materials))
        .route("/", post(routes::materials::create_material))
        .route("/:id", get(routes::materials::get_material))
        .route("/:id", put(routes::materials::update_material))
        .route("/:id", delete(routes::materials::delete_material))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let activity_routes = Router::new()
        .route("/", get(routes::activity::list_activity))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .nest("/materials", material_routes)
        .nest("/activity", activity_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Authentication middleware layer
///
/// Validates the bearer token, resolves the user, and injects
/// [`sitedesk_shared::auth::middleware::AuthContext`] into request
/// extensions. The last_seen touch is dispatched inside
/// `authenticate_request` and never awaited here.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth = authenticate_request(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
