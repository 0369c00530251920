//! HTTP API for the tokenmint access-token service.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tracker;

pub use error::ApiError;
pub use routes::{build_app, create_router};
pub use state::AppState;
pub use tracker::{HealthSnapshot, HealthStatus, HealthTracker};
