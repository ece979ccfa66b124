//! # Catalog Client
//!
//! ```text
//! GET  /product/{id}                    → ProductSnapshot
//! POST /product/{id}/decrease-quantity  {"quantity": n}
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use lapak_core::{CallerId, ProductSnapshot};

use crate::client::ServiceClient;
use crate::config::UpstreamConfig;
use crate::credentials::InternalCredentials;
use crate::error::{UpstreamError, UpstreamResult};
use crate::fanout;

const SERVICE: &str = "catalog";
const RESOURCE: &str = "product";

/// Read and stock operations the purchase flow needs from the catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetches every distinct id concurrently. On success the map has an
    /// entry for each requested id; any failure fails the whole batch.
    async fn get_products(
        &self,
        ids: &[String],
        caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, ProductSnapshot>>;

    /// Lowers the catalog's stock of `product_id` by `quantity`.
    async fn decrease_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        caller: &CallerId,
    ) -> UpstreamResult<()>;
}

#[derive(Serialize)]
struct DecreaseQuantity {
    quantity: i64,
}

/// HTTP client of the catalog service.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    inner: ServiceClient,
}

impl CatalogClient {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        Ok(Self::with_parts(
            config.http_client()?,
            config,
            Arc::new(InternalCredentials::from_config(config)),
        ))
    }

    /// Shares one HTTP client and credential set with other clients.
    pub fn with_parts(
        http: reqwest::Client,
        config: &UpstreamConfig,
        credentials: Arc<InternalCredentials>,
    ) -> Self {
        Self {
            inner: ServiceClient::new(SERVICE, http, config.catalog_url.clone(), credentials),
        }
    }

    /// Fetches one product.
    pub async fn get_product(
        &self,
        id: &str,
        caller: &CallerId,
    ) -> UpstreamResult<ProductSnapshot> {
        let id = require_id(id)?;
        self.inner
            .get_json(&["product", id], RESOURCE, id, caller)
            .await
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    async fn get_products(
        &self,
        ids: &[String],
        caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, ProductSnapshot>> {
        let client = self.clone();
        let caller = caller.clone();
        fanout::fetch_all(RESOURCE, ids, move |id| {
            let client = client.clone();
            let caller = caller.clone();
            async move { client.get_product(&id, &caller).await }
        })
        .await
    }

    async fn decrease_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        caller: &CallerId,
    ) -> UpstreamResult<()> {
        let id = require_id(product_id)?;
        if quantity < 1 {
            return Err(UpstreamError::InvalidIdentifier {
                resource: RESOURCE,
                reason: format!("cannot decrease {id} by {quantity}"),
            });
        }

        self.inner
            .post_json(
                &["product", id, "decrease-quantity"],
                &DecreaseQuantity { quantity },
                RESOURCE,
                id,
                caller,
            )
            .await?;

        info!(product_id = %id, quantity, "Catalog stock decreased");
        Ok(())
    }
}

fn require_id(id: &str) -> UpstreamResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(UpstreamError::InvalidIdentifier {
            resource: RESOURCE,
            reason: "blank id".to_string(),
        });
    }
    Ok(id)
}
