//! Test context wiring a server to a mock identity provider.

use std::net::SocketAddr;
use std::sync::Arc;
use tokenmint_api::{AppState, HealthTracker};
use tokenmint_auth::ServiceCredential;
use tokenmint_core::ServerConfig;
use wiremock::MockServer;

use crate::fixtures::{CredentialFixture, test_config};
use crate::helpers::{ApiTestClient, start_test_server};

/// A running server and the mock provider it talks to.
///
/// Drop this to stop the server.
pub struct TestContext {
    pub provider: MockServer,
    pub addr: SocketAddr,
    pub client: ApiTestClient,
    pub health: Arc<HealthTracker>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestContext {
    /// Start a server with the default test configuration and credential.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with(|config| config, CredentialFixture::credential()).await
    }

    /// Start a server after adjusting the configuration.
    pub async fn with(
        configure: impl FnOnce(ServerConfig) -> ServerConfig,
        credential: ServiceCredential,
    ) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let provider = MockServer::start().await;
        let config = configure(test_config(&provider.uri()));
        let state = AppState::from_config(config, credential)?;
        let health = Arc::clone(&state.health);

        let (addr, handle) = start_test_server(state).await?;

        Ok(Self {
            provider,
            addr,
            client: ApiTestClient::new(addr),
            health,
            handle,
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.provider.uri())
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
