use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKeys;
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::ratings::RatingStore;
use crate::services::RatingService;

/// Shared router state
pub struct AppState<S> {
    pub ratings: Arc<RatingService<S>>,
    pub jwt: Arc<JwtKeys>,
}

impl<S: RatingStore> AppState<S> {
    pub fn new(store: S, jwt: JwtKeys) -> Self {
        Self {
            ratings: Arc::new(RatingService::new(store)),
            jwt: Arc::new(jwt),
        }
    }
}

// Not derived: derive(Clone) would demand S: Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ratings: Arc::clone(&self.ratings),
            jwt: Arc::clone(&self.jwt),
        }
    }
}

pub fn app<S: RatingStore>(state: AppState<S>, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health::<S>))
        // Protected API
        .merge(book_routes(state.jwt.clone()))
        .with_state(state);

    if let Some(cors) = cors_layer(&config.security) {
        router = router.layer(cors);
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn book_routes<S: RatingStore>(jwt: Arc<JwtKeys>) -> Router<AppState<S>> {
    use protected::book;

    Router::new()
        .route("/c/book/:book_id", get(book::book_get::<S>))
        .route(
            "/c/book/:book_id/rating",
            get(book::rating_get::<S>)
                .post(book::rating_post::<S>)
                .put(book::rating_put::<S>)
                .delete(book::rating_delete::<S>),
        )
        .route_layer(middleware::from_fn_with_state(jwt, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any),
    )
}
