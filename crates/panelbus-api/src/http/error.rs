//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use panelbus_core::bus::{BusError, DeliveryFailure};
use panelbus_types::error::ArgumentError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Invalid bus argument (empty names).
    Argument(ArgumentError),
    /// A correlated send failed or was refused by the remote handler.
    Bus(BusError),
    /// Unknown bundle.
    BundleNotFound(String),
    Validation(String),
}

impl From<ArgumentError> for AppError {
    fn from(e: ArgumentError) -> Self {
        AppError::Argument(e)
    }
}

impl From<BusError> for AppError {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Argument(e) => AppError::Argument(e),
            other => AppError::Bus(other),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Argument(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Bus(e @ BusError::Remote(_)) => {
                (StatusCode::BAD_GATEWAY, "REMOTE_ERROR", e.to_string())
            }
            AppError::Bus(e @ BusError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "ACK_TIMEOUT", e.to_string())
            }
            AppError::Bus(e @ BusError::Delivery(DeliveryFailure::Disconnected)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "NO_CLIENTS", e.to_string())
            }
            AppError::Bus(e) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DELIVERY_FAILED", e.to_string())
            }
            AppError::BundleNotFound(name) => (
                StatusCode::NOT_FOUND,
                "BUNDLE_NOT_FOUND",
                format!("Bundle '{name}' not found"),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::warn!(%code, %message, "request failed");
        }

        let body = serde_json::to_string(&ApiResponse::error(code, &message)).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_argument_errors_are_bad_requests() {
        let err: AppError = BusError::Argument(ArgumentError::empty_name("message_name")).into();
        assert!(matches!(err, AppError::Argument(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_bus_failures_map_to_gateway_statuses() {
        assert_eq!(
            AppError::from(BusError::Remote("nope".into())).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(BusError::Timeout(Duration::from_secs(1))).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::from(BusError::Delivery(DeliveryFailure::Disconnected)).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unknown_bundle_is_not_found() {
        let response = AppError::BundleNotFound("ghost".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
