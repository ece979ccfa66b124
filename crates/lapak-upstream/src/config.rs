//! # Upstream Configuration
//!
//! Where the collaborating services live and how to talk to them.

use std::time::Duration;

use url::Url;

use crate::error::{UpstreamError, UpstreamResult};

/// Default gateway name presented in `X-Auth-Gateway`.
pub const DEFAULT_GATEWAY_NAME: &str = "backend-infra";

/// Connection settings shared by the catalog and identity clients.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use lapak_upstream::UpstreamConfig;
///
/// let config = UpstreamConfig::new("http://localhost:3003", "http://localhost:3002", "s3cret")
///     .unwrap()
///     .timeout(Duration::from_secs(5));
/// assert_eq!(config.catalog_url.as_str(), "http://localhost:3003/");
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the catalog (product) service.
    pub catalog_url: Url,

    /// Base URL of the identity (user) service.
    pub identity_url: Url,

    /// Shared secret sent in `X-Secret` and used to sign propagation tokens.
    pub internal_secret: String,

    /// Value of `X-Auth-Gateway`, also the token issuer.
    pub gateway_name: String,

    /// Per-request timeout.
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Lifetime of each propagation token.
    /// Default: 60 seconds
    pub token_ttl: Duration,
}

impl UpstreamConfig {
    pub fn new(
        catalog_url: &str,
        identity_url: &str,
        internal_secret: impl Into<String>,
    ) -> UpstreamResult<Self> {
        let internal_secret = internal_secret.into();
        if internal_secret.is_empty() {
            return Err(UpstreamError::Credentials(
                "internal secret must not be empty".to_string(),
            ));
        }

        Ok(Self {
            catalog_url: parse_base_url(catalog_url)?,
            identity_url: parse_base_url(identity_url)?,
            internal_secret,
            gateway_name: DEFAULT_GATEWAY_NAME.to_string(),
            timeout: Duration::from_secs(30),
            token_ttl: Duration::from_secs(60),
        })
    }

    pub fn gateway_name(mut self, name: impl Into<String>) -> Self {
        self.gateway_name = name.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Builds an HTTP client with the configured timeout. One client can
    /// back both service clients through their `with_parts` constructors.
    pub fn http_client(&self) -> UpstreamResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| UpstreamError::Network {
                service: "http client",
                message: e.to_string(),
            })
    }
}

fn parse_base_url(raw: &str) -> UpstreamResult<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(UpstreamError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}
