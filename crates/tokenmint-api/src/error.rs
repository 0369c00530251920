//! Mapping of service errors onto HTTP responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use tokenmint_core::{Error, ExchangeError};

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// An error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Authentication => StatusCode::UNAUTHORIZED,
        Error::Exchange(exchange) => match exchange {
            ExchangeError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ExchangeError::InvalidAssertion { .. } => StatusCode::BAD_REQUEST,
            ExchangeError::UpstreamError { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(StatusCode::is_server_error)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ExchangeError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            ExchangeError::ConnectivityError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ExchangeError::TimeoutError { .. } => StatusCode::GATEWAY_TIMEOUT,
        },
        Error::Configuration(_) | Error::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn detail_for(err: &Error) -> String {
    match err {
        Error::Authentication => err.to_string(),
        Error::Exchange(_) => format!("Failed to obtain access token: {}", err),
        Error::Signing(_) => "Failed to sign token request".to_string(),
        _ => "Service misconfigured".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: detail_for(&self.0),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(err: ExchangeError) -> StatusCode {
        status_for(&Error::Exchange(err))
    }

    #[test]
    fn test_exchange_status_mapping() {
        assert_eq!(
            exchange(ExchangeError::UpstreamUnavailable { body: String::new() }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            exchange(ExchangeError::InvalidAssertion { body: String::new() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            exchange(ExchangeError::ConnectivityError("refused".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            exchange(ExchangeError::TimeoutError { seconds: 30 }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_upstream_error_relays_only_server_errors() {
        assert_eq!(
            exchange(ExchangeError::UpstreamError {
                status: 503,
                body: String::new()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            exchange(ExchangeError::UpstreamError {
                status: 401,
                body: String::new()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError(Error::Authentication).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn test_signing_detail_hides_key_errors() {
        let err = Error::Signing("invalid private key: bad PEM".to_string());
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!detail_for(&err).contains("PEM"));
    }
}
