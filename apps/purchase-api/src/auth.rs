//! # Authorization Context
//!
//! Requests reach this service only through the API gateway, which
//! authenticates the end user and forwards the identity in trusted headers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Inbound Trust                                    │
//! │                                                                         │
//! │  Gateway ──► X-Secret        ─┐                                        │
//! │              X-Auth-Gateway  ─┼─► TrustVerifier ──► AuthContext         │
//! │              X-User-ID       ─┘        │              { caller }        │
//! │                                        ▼                                │
//! │                               401 if secret/gateway wrong              │
//! │                                                                         │
//! │  AuthContext::require_caller ──► CallerId, or Unauthenticated          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The headers are checked once, here. Handlers and the orchestrator only
//! ever see the resulting [`AuthContext`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use thiserror::Error;
use tracing::warn;

use lapak_core::CallerId;
use lapak_upstream::credentials::{HEADER_GATEWAY, HEADER_SECRET, HEADER_USER_ID};

use crate::error::ApiError;
use crate::services::{PurchaseError, PurchaseResult};
use crate::AppState;

/// Why the trust headers were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    #[error("Missing internal secret")]
    MissingSecret,

    #[error("Invalid internal secret")]
    InvalidSecret,

    #[error("Missing gateway name")]
    MissingGateway,

    #[error("Unknown gateway: {0}")]
    UnknownGateway(String),
}

/// Verified identity of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// End user the gateway vouched for. `None` for anonymous requests.
    pub caller: Option<CallerId>,
}

impl AuthContext {
    pub fn for_caller(caller: CallerId) -> Self {
        Self {
            caller: Some(caller),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The caller, or `Unauthenticated`.
    pub fn require_caller(&self) -> PurchaseResult<&CallerId> {
        self.caller.as_ref().ok_or(PurchaseError::Unauthenticated)
    }
}

/// Checks that a request really came through the gateway.
pub trait TrustVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap) -> Result<AuthContext, TrustError>;
}

/// Shared-secret trust between the gateway and this service.
pub struct GatewayTrust {
    secret: String,
    gateway: String,
}

impl GatewayTrust {
    pub fn new(secret: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            gateway: gateway.into(),
        }
    }
}

impl std::fmt::Debug for GatewayTrust {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayTrust")
            .field("secret", &"<redacted>")
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl TrustVerifier for GatewayTrust {
    fn verify(&self, headers: &HeaderMap) -> Result<AuthContext, TrustError> {
        let secret = header(headers, HEADER_SECRET).ok_or(TrustError::MissingSecret)?;
        if !constant_time_eq(secret, &self.secret) {
            return Err(TrustError::InvalidSecret);
        }

        let gateway = header(headers, HEADER_GATEWAY).ok_or(TrustError::MissingGateway)?;
        if gateway != self.gateway {
            return Err(TrustError::UnknownGateway(gateway.to_string()));
        }

        Ok(AuthContext {
            caller: header(headers, HEADER_USER_ID).and_then(CallerId::new),
        })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.trust.verify(&parts.headers).map_err(|err| {
            warn!(error = %err, path = %parts.uri.path(), "Rejected untrusted request");
            ApiError::unauthenticated("Unauthorized")
        })
    }
}
