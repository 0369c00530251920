//! API route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, info, token};
use crate::middleware::{cors_layer, request_id};
use crate::state::AppState;

/// Create the router with all endpoints and middleware applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id))
}

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/readiness", get(health::readiness))
        .route("/liveness", get(health::liveness))
        .route("/token", post(token::issue_token))
        .route("/info", get(info::info))
        .route("/docs-info", get(info::info));

    if state.config.docs_enabled() {
        router = router.route("/openapi.json", get(info::openapi));
    }

    router.with_state(state)
}
