//! # Upstream Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Upstream Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Input       │  │   Transport     │  │      Response           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidId      │  │  Network        │  │  NotFound (404)         │ │
//! │  │  EmptyBatch     │  │  Timeout        │  │  Status (other non-2xx) │ │
//! │  │  InvalidUrl     │  │  TaskFailed     │  │  Decode                 │ │
//! │  │  Credentials    │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// A blank identifier was passed to a lookup.
    #[error("Invalid {resource} identifier: {reason}")]
    InvalidIdentifier {
        resource: &'static str,
        reason: String,
    },

    /// A batch lookup was called with no identifiers.
    #[error("Empty {resource} batch")]
    EmptyBatch { resource: &'static str },

    /// Base URL of a service is unusable.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// Trust headers or the propagation token could not be built.
    #[error("Credential error: {0}")]
    Credentials(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connection refused, reset, DNS failure, ...
    #[error("{service} unreachable: {message}")]
    Network {
        service: &'static str,
        message: String,
    },

    /// No response within the configured timeout.
    #[error("{service} timed out")]
    Timeout { service: &'static str },

    /// A fan-out branch panicked or was cancelled.
    #[error("Lookup task failed: {0}")]
    TaskFailed(String),

    // =========================================================================
    // Response Errors
    // =========================================================================
    /// The service answered 404 for this id.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The service answered with another non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        UpstreamError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Classifies a reqwest failure of a call to `service`.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout { service }
        } else if err.is_decode() {
            UpstreamError::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            UpstreamError::Network {
                service,
                message: err.to_string(),
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound { .. })
    }
}

impl From<url::ParseError> for UpstreamError {
    fn from(err: url::ParseError) -> Self {
        UpstreamError::InvalidUrl(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for UpstreamError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        UpstreamError::Credentials(err.to_string())
    }
}
