//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Purchase API                       │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  PurchaseService ─── PurchaseError ──┐                                 │
//! │         │                            │                                  │
//! │         ▼                            ▼                                  │
//! │  ValidationErrors ───────────────► ApiError ──► (status, JSON body)    │
//! │  DbError / UpstreamError                 │                              │
//! │     (logged, never returned)             │                              │
//! │                                          ▼                              │
//! │  {"code": "NOT_FOUND", "error": "Purchase not found"}                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::services::PurchaseError;

/// Error body returned by every route.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "error": "Validation failed",
///   "details": { "senderName": "senderName must be at least 4 characters" }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: String,

    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing or untrusted identity (401)
    Unauthenticated,

    /// Caller does not own the resource (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Catalog or identity service failed (502)
    DownstreamUnavailable,

    /// Storage failed (500)
    PersistenceError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::DownstreamUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCode::PersistenceError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn with_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts orchestrator errors to API errors.
impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::Validation(errors) => {
                ApiError::validation("Validation failed").with_details(errors.by_field())
            }
            PurchaseError::Unauthenticated => ApiError::unauthenticated("Unauthorized"),
            PurchaseError::Forbidden { purchase_id } => {
                warn!(purchase_id = %purchase_id, "Access to foreign purchase denied");
                ApiError::new(ErrorCode::Forbidden, "Access denied")
            }
            PurchaseError::InvalidPurchaseId(_) | PurchaseError::PurchaseNotFound(_) => {
                ApiError::not_found("Purchase not found")
            }
            PurchaseError::ProductNotFound(id) => {
                ApiError::not_found(format!("Product not found: {id}"))
            }
            err @ PurchaseError::SellerLookupFailed { .. } => {
                error!(error = %err, "Seller lookup failed");
                ApiError::new(
                    ErrorCode::DownstreamUnavailable,
                    "Seller details are unavailable",
                )
            }
            err @ PurchaseError::DownstreamUnavailable { .. } => {
                error!(error = %err, "Downstream service failed");
                ApiError::new(
                    ErrorCode::DownstreamUnavailable,
                    "A downstream service is unavailable",
                )
            }
            err @ PurchaseError::Persistence { .. } => {
                error!(error = %err, "Persistence failed");
                ApiError::new(ErrorCode::PersistenceError, "Database operation failed")
            }
            PurchaseError::Pricing(err) => {
                error!(error = %err, "Pricing failed");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapak_core::{ValidationError, ValidationErrors};
    use lapak_db::DbError;
    use lapak_upstream::UpstreamError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PurchaseError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                PurchaseError::Forbidden {
                    purchase_id: "p".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (PurchaseError::InvalidPurchaseId("x".into()), StatusCode::NOT_FOUND),
            (PurchaseError::PurchaseNotFound("x".into()), StatusCode::NOT_FOUND),
            (PurchaseError::ProductNotFound("p-1".into()), StatusCode::NOT_FOUND),
            (
                PurchaseError::SellerLookupFailed {
                    source: UpstreamError::not_found("seller", "s-1"),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                PurchaseError::DownstreamUnavailable {
                    step: "fetch products",
                    source: UpstreamError::Timeout { service: "catalog" },
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                PurchaseError::Persistence {
                    step: "store purchase",
                    source: DbError::PoolExhausted,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = ApiError::from(PurchaseError::Persistence {
            step: "store purchase",
            source: DbError::QueryFailed("no such table: purchases".into()),
        });

        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "PERSISTENCE_ERROR");
        assert!(!body["error"].as_str().unwrap().contains("purchases"));
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required {
            field: "senderName".into(),
        });

        let body = serde_json::to_value(ApiError::from(PurchaseError::Validation(errors))).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["senderName"], "senderName is required");
    }
}
