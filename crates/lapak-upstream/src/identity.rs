//! # Identity Client
//!
//! ```text
//! GET /user/{id} → SellerSnapshot (payout bank details)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use lapak_core::{CallerId, SellerSnapshot};

use crate::client::ServiceClient;
use crate::config::UpstreamConfig;
use crate::credentials::InternalCredentials;
use crate::error::{UpstreamError, UpstreamResult};
use crate::fanout;

const SERVICE: &str = "identity";
const RESOURCE: &str = "seller";

/// Seller lookups the purchase flow needs from the identity service.
#[async_trait]
pub trait SellerDirectory: Send + Sync {
    /// Fetches every distinct id concurrently, failing fast.
    async fn get_sellers(
        &self,
        ids: &[String],
        caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, SellerSnapshot>>;
}

/// HTTP client of the identity service.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    inner: ServiceClient,
}

impl IdentityClient {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        Ok(Self::with_parts(
            config.http_client()?,
            config,
            Arc::new(InternalCredentials::from_config(config)),
        ))
    }

    pub fn with_parts(
        http: reqwest::Client,
        config: &UpstreamConfig,
        credentials: Arc<InternalCredentials>,
    ) -> Self {
        Self {
            inner: ServiceClient::new(SERVICE, http, config.identity_url.clone(), credentials),
        }
    }

    /// Fetches one seller.
    pub async fn get_seller(&self, id: &str, caller: &CallerId) -> UpstreamResult<SellerSnapshot> {
        let id = id.trim();
        if id.is_empty() {
            return Err(UpstreamError::InvalidIdentifier {
                resource: RESOURCE,
                reason: "blank id".to_string(),
            });
        }
        self.inner.get_json(&["user", id], RESOURCE, id, caller).await
    }
}

#[async_trait]
impl SellerDirectory for IdentityClient {
    async fn get_sellers(
        &self,
        ids: &[String],
        caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, SellerSnapshot>> {
        let client = self.clone();
        let caller = caller.clone();
        fanout::fetch_all(RESOURCE, ids, move |id| {
            let client = client.clone();
            let caller = caller.clone();
            async move { client.get_seller(&id, &caller).await }
        })
        .await
    }
}
