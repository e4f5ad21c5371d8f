use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::TokenAuthenticator;
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::{auth::TOKEN_HEADER, token_auth_middleware};
use crate::services::{AccountService, PostService, ProfileService};
use crate::store::ResourceStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ResourceStore>,
    pub authenticator: Arc<TokenAuthenticator>,
    pub posts: PostService,
    pub profiles: ProfileService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ResourceStore>) -> Self {
        let authenticator = Arc::new(TokenAuthenticator::new(&config.security));
        Self {
            posts: PostService::new(Arc::clone(&store)),
            profiles: ProfileService::new(Arc::clone(&store)),
            accounts: AccountService::new(Arc::clone(&store)),
            config: Arc::new(config),
            store,
            authenticator,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));
    let request_logging = state.config.api.enable_request_logging;

    let app = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state))
        .with_state(state)
        .layer(middleware);

    if request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/auth", post(public::auth::login))
        .route("/api/profile", get(public::profile::list))
        .route("/api/profile/user/:user_id", get(public::profile::by_user))
}

/// Everything here requires a valid token.
fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{auth, posts, profile};

    Router::new()
        .route("/api/auth", get(auth::current_user))
        // Profile
        .route("/api/profile", post(profile::upsert).delete(profile::delete_account))
        .route("/api/profile/me", get(profile::me))
        .route("/api/profile/experience", put(profile::add_experience))
        .route("/api/profile/experience/:exp_id", delete(profile::remove_experience))
        .route("/api/profile/education", put(profile::add_education))
        .route("/api/profile/education/:edu_id", delete(profile::remove_education))
        // Posts
        .route("/api/posts", post(posts::create).get(posts::list))
        .route("/api/posts/:id", get(posts::get).delete(posts::delete))
        .route("/api/posts/like/:id", put(posts::like))
        .route("/api/posts/unlike/:id", put(posts::unlike))
        .route("/api/posts/comment/:id", post(posts::comment))
        .route("/api/posts/comment/:id/:comment_id", delete(posts::uncomment))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.authenticator),
            token_auth_middleware,
        ))
}

/// Without CORS enabled the layer allows no origins, so browsers on other
/// origins are refused.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            HeaderName::from_static(TOKEN_HEADER),
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ]);

    if !config.security.enable_cors {
        return base;
    }
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}
