//! Test helper functions and utilities.

use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokenmint_api::{AppState, build_app};
use tokio::net::TcpListener;

/// Start an API server for testing and return its address.
pub async fn start_test_server(
    state: AppState,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_app(Arc::new(state));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((addr, handle))
}

/// Create an HTTP client for testing.
pub fn test_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create test client")
}

/// API test client with base URL.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            client: test_client(),
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        Ok(self.get(path).await?.json().await?)
    }

    /// Request a token with `api_key` as the bearer credential.
    pub async fn post_token(&self, api_key: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.url("/token"))
            .bearer_auth(api_key)
            .send()
            .await
    }

    /// Request a token without an Authorization header.
    pub async fn post_token_anonymous(&self) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url("/token")).send().await
    }
}

/// Pull the form-encoded `assertion` out of a token request body.
///
/// Compact JWS characters are all unreserved, so no decoding is needed.
pub fn assertion_from_form(body: &[u8]) -> Option<String> {
    std::str::from_utf8(body)
        .ok()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("assertion="))
        .map(str::to_string)
}
