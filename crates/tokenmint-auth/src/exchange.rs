//! Assertion-for-access-token exchange against the provider's token endpoint.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::assertion::Assertion;
use tokenmint_core::error::truncate_body;
use tokenmint_core::token::DEFAULT_EXPIRES_IN_SECS;
use tokenmint_core::{AccessToken, ExchangeError};

/// Grant type of the RFC 7523 JWT bearer flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Exchanges a signed assertion for an access token.
///
/// Implementations never retry; every failure is returned as-is.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, assertion: &Assertion) -> Result<AccessToken, ExchangeError>;
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
    expires_in: Option<i64>,
}

/// Token exchange over HTTP with a bounded request timeout.
pub struct HttpTokenExchanger {
    client: reqwest::Client,
    token_url: String,
    timeout: Duration,
}

impl HttpTokenExchanger {
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::ConnectivityError(e.to_string()))?;

        Ok(Self {
            client,
            token_url: token_url.into(),
            timeout,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn classify_transport(&self, err: reqwest::Error) -> ExchangeError {
        if err.is_timeout() {
            ExchangeError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else {
            ExchangeError::ConnectivityError(err.to_string())
        }
    }
}

/// Map a non-200 status and its body to an error category.
pub fn classify_status(status: StatusCode, body: &str) -> ExchangeError {
    let body = truncate_body(body);
    match status {
        StatusCode::BAD_GATEWAY => ExchangeError::UpstreamUnavailable { body },
        StatusCode::BAD_REQUEST => ExchangeError::InvalidAssertion { body },
        other => ExchangeError::UpstreamError {
            status: other.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, assertion: &Assertion) -> Result<AccessToken, ExchangeError> {
        debug!(token_url = %self.token_url, "Exchanging assertion for access token");

        let requested_at = Utc::now();
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.token())])
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify_transport(e))?;

        if status != StatusCode::OK {
            let err = classify_status(status, &body);
            warn!(
                status = status.as_u16(),
                kind = err.kind(),
                body = %truncate_body(&body),
                "Token endpoint rejected exchange"
            );
            return Err(err);
        }

        let parsed: TokenEndpointResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::InvalidResponse(format!("body is not JSON: {}", e)))?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExchangeError::InvalidResponse("missing access_token".to_string()))?;

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        AccessToken::bearer(access_token, expires_in, requested_at).ok_or_else(|| {
            ExchangeError::InvalidResponse(format!("unusable expires_in: {}", expires_in))
        })
    }
}
