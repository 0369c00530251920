//! Access tokens issued by the identity provider.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// A bearer token minted for the service identity.
///
/// Never cached; each successful exchange produces a fresh one.
#[derive(Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a bearer token that expires `expires_in` seconds after `issued_at`.
    ///
    /// Returns `None` when `expires_in` is not positive or the expiry falls
    /// outside the representable time range.
    pub fn bearer(
        access_token: impl Into<String>,
        expires_in: i64,
        issued_at: DateTime<Utc>,
    ) -> Option<Self> {
        if expires_in <= 0 {
            return None;
        }
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))?;

        Some(Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
        })
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
