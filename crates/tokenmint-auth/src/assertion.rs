//! Signed JWT assertions for the jwt-bearer grant.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::credentials::ServiceCredential;
use tokenmint_core::{Error, Result};

/// Assertion lifetime. The provider rejects anything longer than an hour.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims asking the provider to act as the service identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed assertion. Built per token request and never reused.
#[derive(Clone)]
pub struct Assertion {
    pub claims: AssertionClaims,
    token: String,
}

impl Assertion {
    /// The compact JWS to send to the token endpoint.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("claims", &self.claims)
            .field("token", &"[censored]")
            .finish()
    }
}

/// RS256 signer bound to a credential's private key.
pub struct AssertionSigner {
    encoding_key: EncodingKey,
    key_id: Option<String>,
}

impl AssertionSigner {
    pub fn from_credential(credential: &ServiceCredential) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(credential.private_key.as_bytes())
            .map_err(|e| Error::Signing(format!("invalid private key: {}", e)))?;

        Ok(Self {
            encoding_key,
            key_id: credential.private_key_id.clone(),
        })
    }

    pub fn sign(&self, claims: &AssertionClaims) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        encode(&header, claims, &self.encoding_key).map_err(|e| Error::Signing(e.to_string()))
    }
}

/// Builds assertions for a fixed scope set and audience.
#[derive(Debug, Clone)]
pub struct AssertionBuilder {
    scopes: Vec<String>,
    audience: String,
}

impl AssertionBuilder {
    pub fn new(scopes: Vec<String>, audience: impl Into<String>) -> Self {
        Self {
            scopes,
            audience: audience.into(),
        }
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Build and sign an assertion issued at `now`.
    ///
    /// An incomplete credential is a configuration error; a key that cannot
    /// sign is a signing error.
    pub fn build(&self, credential: &ServiceCredential, now: DateTime<Utc>) -> Result<Assertion> {
        if credential.client_email.trim().is_empty() {
            return Err(Error::Configuration(
                "service account credential has no client_email".to_string(),
            ));
        }
        if credential.private_key.trim().is_empty() {
            return Err(Error::Configuration(
                "service account credential has no private_key".to_string(),
            ));
        }

        let claims = AssertionClaims {
            iss: credential.client_email.clone(),
            sub: credential.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let token = AssertionSigner::from_credential(credential)?.sign(&claims)?;
        Ok(Assertion { claims, token })
    }
}
