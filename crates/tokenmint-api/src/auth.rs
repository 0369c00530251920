//! Caller authentication with the static API key.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

use tokenmint_core::Error;

use crate::error::ApiError;
use crate::state::AppState;

/// Proof that the request carried `Authorization: Bearer <API_KEY>`.
///
/// Rejection happens before the handler runs, so unauthenticated requests
/// never touch the health counters.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<Arc<AppState>> for ApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    warn!("Token request without bearer credentials");
                    ApiError(Error::Authentication)
                })?;

        if !keys_match(bearer.token(), &state.config.api_key) {
            warn!("Token request with invalid API key");
            return Err(ApiError(Error::Authentication));
        }

        Ok(ApiKey)
    }
}

/// Compare keys in constant time. An empty expected key matches nothing.
fn keys_match(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
