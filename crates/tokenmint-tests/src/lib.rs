//! Integration test infrastructure for tokenmint.
//!
//! Runs the real router on a loopback port against a wiremock stand-in for
//! the identity provider.
//!
//! # Usage
//!
//! ```ignore
//! use tokenmint_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     // Use ctx.provider, ctx.client, ctx.health, etc.
//! }
//! ```

pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::TestContext;
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tokenmint_api=debug,tokenmint_auth=debug")),
        )
        .with_test_writer()
        .try_init();
}
