//! Access token issuance.

use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::{error, info};

use tokenmint_core::{AccessToken, Error};

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::state::AppState;

/// Mint a fresh access token for the service identity.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    _key: ApiKey,
) -> Result<Json<AccessToken>, ApiError> {
    state.health.record_attempt_start();
    let result = state.mint_token().await;
    state.health.record_result(result.is_ok());

    match result {
        Ok(token) => {
            info!(expires_in = token.expires_in, "Issued access token");
            Ok(Json(token))
        }
        Err(err) => {
            let consecutive_failures = state.health.snapshot().consecutive_failures;
            match &err {
                Error::Exchange(exchange) => error!(
                    kind = exchange.kind(),
                    retryable = exchange.is_retryable(),
                    consecutive_failures,
                    error = %exchange,
                    "Token exchange failed"
                ),
                other => error!(consecutive_failures, error = %other, "Token request failed"),
            }
            Err(err.into())
        }
    }
}
