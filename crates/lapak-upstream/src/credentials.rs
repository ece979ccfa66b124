//! # Internal Credentials
//!
//! What every outbound call presents to the catalog and identity services.
//!
//! ```text
//! X-Secret:        <INTERNAL_SECRET>           shared secret
//! X-Auth-Gateway:  backend-infra               who vouches for the caller
//! X-User-ID:       <caller id>                 end user the call acts for
//! Authorization:   Bearer <jwt>                HS256, sub = caller id,
//!                                              iss = gateway, short-lived
//! ```
//!
//! The token is minted per call, so a captured token is only useful for
//! its short lifetime and only for the user it names.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lapak_core::CallerId;

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};

pub const HEADER_SECRET: &str = "x-secret";
pub const HEADER_GATEWAY: &str = "x-auth-gateway";
pub const HEADER_USER_ID: &str = "x-user-id";

/// Claims of a propagation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationClaims {
    /// Caller (end user) id
    pub sub: String,

    /// Gateway that vouches for the caller
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique per call)
    pub jti: String,
}

/// Builds the trust headers for outbound calls.
#[derive(Clone)]
pub struct InternalCredentials {
    secret: String,
    gateway: String,
    token_ttl: Duration,
}

impl std::fmt::Debug for InternalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalCredentials")
            .field("secret", &"<redacted>")
            .field("gateway", &self.gateway)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl InternalCredentials {
    pub fn new(secret: impl Into<String>, gateway: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            gateway: gateway.into(),
            token_ttl,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.internal_secret.clone(),
            config.gateway_name.clone(),
            config.token_ttl,
        )
    }

    /// Mints a propagation token for `caller`.
    pub fn issue_token(&self, caller: &CallerId) -> UpstreamResult<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = PropagationClaims {
            sub: caller.as_str().to_string(),
            iss: self.gateway.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Checks a propagation token: signature, expiry and issuer.
    pub fn verify_token(&self, token: &str) -> UpstreamResult<PropagationClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.gateway.as_str()]);
        validation.leeway = 0;

        let data = decode::<PropagationClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    /// Full header set for one call made on behalf of `caller`.
    pub fn headers_for(&self, caller: &CallerId) -> UpstreamResult<HeaderMap> {
        let token = self.issue_token(caller)?;

        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(HeaderName::from_static(HEADER_SECRET), header_value(&self.secret)?);
        headers.insert(HeaderName::from_static(HEADER_GATEWAY), header_value(&self.gateway)?);
        headers.insert(HeaderName::from_static(HEADER_USER_ID), header_value(caller.as_str())?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> UpstreamResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| UpstreamError::Credentials(format!("unusable header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}
