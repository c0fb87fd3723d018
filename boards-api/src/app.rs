/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use boards_api::{app::{build_router, AppState}, config::Config};
/// use boards_shared::db::pool::{create_pool, DatabaseConfig};
/// use boards_shared::store::postgres::PgStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use boards_shared::{
    auth::{middleware::principal_from_headers, tokens::TokenService},
    services::Services,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let services = Services::new(
            store,
            TokenService::new(config.token_policy()),
            config.service_settings(),
        );

        Self {
            services,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/                signup, signin, signup_request,
///     │                         username/validate, forgot_password, reset_password
///     ├── /users/me             GET, PUT; /password PUT; /cancel POST
///     └── /boards/              GET, POST; /:id GET, PUT, DELETE; /:id/leave POST
///         └── /collaborators/   GET, POST; /:id GET, PUT, DELETE
///             └── /requests/    GET, POST; /:id GET; /:id/accept PUT; /:id/reject PUT
/// ```
///
/// Every `/v1` route runs behind the principal layer; routes decide access
/// themselves, so anonymous requests reach every handler.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/signin", post(routes::auth::signin))
        .route("/signup_request", post(routes::auth::request_signup))
        .route("/username/validate", post(routes::auth::validate_username))
        .route("/forgot_password", post(routes::auth::forgot_password))
        .route("/reset_password", post(routes::auth::reset_password));

    let user_routes = Router::new()
        .route("/me", get(routes::users::me).put(routes::users::update_settings))
        .route("/me/password", put(routes::users::change_password))
        .route("/me/cancel", post(routes::users::cancel_account));

    let request_routes = Router::new()
        .route(
            "/",
            get(routes::requests::list_requests).post(routes::requests::create_request),
        )
        .route("/:id", get(routes::requests::get_request))
        .route("/:id/accept", put(routes::requests::accept_request))
        .route("/:id/reject", put(routes::requests::reject_request));

    let collaborator_routes = Router::new()
        .route(
            "/",
            get(routes::collaborators::list_collaborators)
                .post(routes::collaborators::add_collaborators),
        )
        .route(
            "/:id",
            get(routes::collaborators::get_collaborator)
                .put(routes::collaborators::update_collaborator)
                .delete(routes::collaborators::remove_collaborator),
        )
        .nest("/requests", request_routes);

    let board_routes = Router::new()
        .route("/", get(routes::boards::list_boards).post(routes::boards::create_board))
        .route(
            "/:id",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/:id/leave", post(routes::boards::leave_board))
        .nest("/collaborators", collaborator_routes);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/boards", board_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            principal_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
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

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the request principal and stores it in the request extensions
///
/// A missing `Authorization` header yields an anonymous principal; a present
/// but invalid one is rejected with 401.
async fn principal_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = principal_from_headers(req.headers(), state.jwt_secret())?;

    if let Some(user_id) = principal.user_id() {
        tracing::debug!(user_id = %user_id, "Authenticated request");
    }

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
