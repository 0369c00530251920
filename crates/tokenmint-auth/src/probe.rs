//! Readiness probing of the identity provider.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A point-in-time reachability check of an external dependency.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Whether the dependency answered within the probe timeout.
    async fn is_reachable(&self) -> bool;
}

/// Probes a URL with a short GET. Any HTTP answer counts as reachable;
/// only transport failures and timeouts do not.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = response.status().as_u16(), "Readiness probe answered");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Readiness probe failed");
                false
            }
        }
    }
}
