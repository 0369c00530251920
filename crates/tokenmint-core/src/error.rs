//! Error types for tokenmint.

use thiserror::Error;

/// Maximum number of characters of an upstream body kept in errors and logs.
pub const MAX_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum Error {
    // Startup errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Caller errors
    #[error("Invalid API key")]
    Authentication,

    // Assertion errors
    #[error("Failed to sign assertion: {0}")]
    Signing(String),

    // Provider errors
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories of the assertion-for-token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The provider answered 502; safe for the caller to retry.
    #[error("Token endpoint unavailable (HTTP 502): {body}")]
    UpstreamUnavailable { body: String },

    /// The provider rejected the assertion with 400.
    #[error("Token endpoint rejected the assertion (HTTP 400): {body}")]
    InvalidAssertion { body: String },

    /// Any other non-200 answer.
    #[error("Token endpoint returned HTTP {status}: {body}")]
    UpstreamError { status: u16, body: String },

    /// A 200 answer that could not be turned into an access token.
    #[error("Token endpoint returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Could not reach token endpoint: {0}")]
    ConnectivityError(String),

    #[error("Token endpoint did not answer within {seconds}s")]
    TimeoutError { seconds: u64 },
}

impl ExchangeError {
    /// Whether repeating the same request may succeed without changing it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::UpstreamUnavailable { .. }
                | ExchangeError::ConnectivityError(_)
                | ExchangeError::TimeoutError { .. }
        )
    }

    /// Stable identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ExchangeError::InvalidAssertion { .. } => "invalid_assertion",
            ExchangeError::UpstreamError { .. } => "upstream_error",
            ExchangeError::InvalidResponse(_) => "invalid_response",
            ExchangeError::ConnectivityError(_) => "connectivity_error",
            ExchangeError::TimeoutError { .. } => "timeout_error",
        }
    }
}

/// Cut `body` down to [`MAX_BODY_CHARS`] characters, marking the cut.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
