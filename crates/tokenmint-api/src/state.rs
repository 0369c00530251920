//! Application state shared across handlers.

use chrono::Utc;
use std::sync::Arc;

use tokenmint_auth::{
    AssertionBuilder, HttpProbe, HttpTokenExchanger, ReadinessProbe, ServiceCredential,
    TokenExchanger,
};
use tokenmint_core::{AccessToken, Error, Result, ServerConfig};

use crate::tracker::HealthTracker;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub credential: Arc<ServiceCredential>,
    pub assertions: AssertionBuilder,
    pub exchanger: Arc<dyn TokenExchanger>,
    pub probe: Arc<dyn ReadinessProbe>,
    pub health: Arc<HealthTracker>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        credential: ServiceCredential,
        exchanger: Arc<dyn TokenExchanger>,
        probe: Arc<dyn ReadinessProbe>,
    ) -> Self {
        let assertions = AssertionBuilder::new(config.scope_list(), config.token_url.clone());
        Self {
            config: Arc::new(config),
            credential: Arc::new(credential),
            assertions,
            exchanger,
            probe,
            health: HealthTracker::new(),
        }
    }

    /// Build state with the HTTP exchanger and probe described by `config`.
    pub fn from_config(config: ServerConfig, credential: ServiceCredential) -> Result<Self> {
        let exchanger = HttpTokenExchanger::new(config.token_url.clone(), config.exchange_timeout())?;
        let probe = HttpProbe::new(config.probe_target(), config.probe_timeout())
            .map_err(|e| Error::Configuration(format!("failed to build probe client: {}", e)))?;

        Ok(Self::new(config, credential, Arc::new(exchanger), Arc::new(probe)))
    }

    /// Sign a fresh assertion and exchange it for an access token.
    pub async fn mint_token(&self) -> Result<AccessToken> {
        let assertion = self.assertions.build(&self.credential, Utc::now())?;
        let token = self.exchanger.exchange(&assertion).await?;
        Ok(token)
    }
}
