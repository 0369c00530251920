//! Test fixtures for credentials and provider responses.

use serde_json::{Value, json};
use tokenmint_auth::ServiceCredential;
use tokenmint_core::ServerConfig;

/// RSA key pair used to sign and verify test assertions.
pub const TEST_PRIVATE_KEY: &str = include_str!("../../../testdata/test-rsa-private.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../../../testdata/test-rsa-public.pem");

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_CLIENT_EMAIL: &str = "minter@demo-project.iam.gserviceaccount.com";
pub const TEST_KEY_ID: &str = "0123456789abcdef";

/// Factory for service account credentials.
pub struct CredentialFixture;

impl CredentialFixture {
    /// Credential file contents as the provider's console produces them.
    pub fn json() -> String {
        json!({
            "type": "service_account",
            "project_id": "demo-project",
            "private_key_id": TEST_KEY_ID,
            "private_key": TEST_PRIVATE_KEY,
            "client_email": TEST_CLIENT_EMAIL,
            "client_id": "100000000000000000001",
            "token_uri": "https://oauth2.googleapis.com/token"
        })
        .to_string()
    }

    pub fn credential() -> ServiceCredential {
        ServiceCredential::new(TEST_CLIENT_EMAIL, TEST_PRIVATE_KEY).with_key_id(TEST_KEY_ID)
    }

    /// A credential with no signing key.
    pub fn incomplete() -> ServiceCredential {
        ServiceCredential::new(TEST_CLIENT_EMAIL, "")
    }
}

/// Factory for token endpoint bodies.
pub struct ProviderFixture;

impl ProviderFixture {
    pub fn token(access_token: &str, expires_in: i64) -> Value {
        json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": expires_in
        })
    }

    pub fn invalid_grant() -> Value {
        json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })
    }
}

/// Configuration pointing at a mock provider base URL.
pub fn test_config(provider_uri: &str) -> ServerConfig {
    ServerConfig::default()
        .with_api_key(TEST_API_KEY)
        .with_token_url(format!("{}/token", provider_uri))
        .with_probe_url(provider_uri)
        .with_exchange_timeout(1)
        .with_probe_timeout(1)
}
