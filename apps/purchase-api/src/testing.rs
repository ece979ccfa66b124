//! In-process fakes of the catalog and identity services, and fixtures
//! shared by the orchestrator and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lapak_core::dto::{CreatePurchaseRequest, PaymentProofRequest, PurchaseItemRequest};
use lapak_core::{
    CallerId, Money, ProductSnapshot, PurchaseValidator, SellerSnapshot, ValidationRules,
};
use lapak_db::{Database, DbConfig};
use lapak_upstream::{ProductCatalog, SellerDirectory, UpstreamError, UpstreamResult};

use crate::auth::AuthContext;
use crate::services::{PurchaseService, ServiceOptions};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
pub(crate) struct FakeCatalog {
    products: Mutex<HashMap<String, ProductSnapshot>>,
    fail_with_status: Option<u16>,
    pub decrements: Mutex<Vec<(String, i64)>>,
    pub lookups: Mutex<usize>,
}

impl FakeCatalog {
    pub fn with(products: Vec<ProductSnapshot>) -> Self {
        FakeCatalog {
            products: Mutex::new(
                products
                    .into_iter()
                    .map(|p| (p.product_id.clone(), p))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// Every lookup fails with `status`.
    pub fn failing(status: u16) -> Self {
        FakeCatalog {
            fail_with_status: Some(status),
            ..Default::default()
        }
    }

    pub fn set_price(&self, product_id: &str, cents: i64) {
        let mut products = self.products.lock().unwrap();
        if let Some(product) = products.get_mut(product_id) {
            product.price = Money::from_cents(cents);
        }
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn get_products(
        &self,
        ids: &[String],
        _caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, ProductSnapshot>> {
        *self.lookups.lock().unwrap() += 1;
        if let Some(status) = self.fail_with_status {
            return Err(UpstreamError::Status {
                service: "catalog",
                status,
                body: String::new(),
            });
        }
        let products = self.products.lock().unwrap();
        ids.iter()
            .map(|id| {
                products
                    .get(id)
                    .cloned()
                    .map(|p| (id.clone(), p))
                    .ok_or_else(|| UpstreamError::not_found("product", id.as_str()))
            })
            .collect()
    }

    async fn decrease_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        _caller: &CallerId,
    ) -> UpstreamResult<()> {
        self.decrements
            .lock()
            .unwrap()
            .push((product_id.to_string(), quantity));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    sellers: HashMap<String, SellerSnapshot>,
    pub requested: Mutex<Vec<Vec<String>>>,
}

impl FakeDirectory {
    pub fn with(sellers: Vec<SellerSnapshot>) -> Self {
        FakeDirectory {
            sellers: sellers.into_iter().map(|s| (s.id.clone(), s)).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SellerDirectory for FakeDirectory {
    async fn get_sellers(
        &self,
        ids: &[String],
        _caller: &CallerId,
    ) -> UpstreamResult<HashMap<String, SellerSnapshot>> {
        self.requested.lock().unwrap().push(ids.to_vec());
        ids.iter()
            .map(|id| {
                self.sellers
                    .get(id)
                    .cloned()
                    .map(|s| (id.clone(), s))
                    .ok_or_else(|| UpstreamError::not_found("seller", id.as_str()))
            })
            .collect()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn product(id: &str, seller: &str, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: id.to_string(),
        name: format!("Product {id}"),
        category: "snacks".to_string(),
        stock: 500,
        price: Money::from_cents(cents),
        sku: format!("SKU-{id}"),
        file_id: format!("file-{id}"),
        file_uri: format!("https://files/{id}"),
        file_thumbnail_uri: format!("https://files/{id}/thumb"),
        seller_id: seller.to_string(),
    }
}

pub(crate) fn seller(id: &str, bank: &str) -> SellerSnapshot {
    SellerSnapshot {
        id: id.to_string(),
        bank_account_name: bank.to_string(),
        bank_account_holder: format!("Holder {id}"),
        bank_account_number: format!("000-{id}"),
    }
}

pub(crate) fn buyer(id: &str) -> AuthContext {
    AuthContext::for_caller(CallerId::new(id).unwrap())
}

pub(crate) fn order(lines: &[(&str, i64)]) -> CreatePurchaseRequest {
    CreatePurchaseRequest {
        purchased_items: lines
            .iter()
            .map(|(id, qty)| PurchaseItemRequest {
                product_id: id.to_string(),
                qty: *qty,
            })
            .collect(),
        sender_name: "Budi Santoso".to_string(),
        sender_contact_type: "email".to_string(),
        sender_contact_detail: "budi@example.com".to_string(),
    }
}

pub(crate) fn proof(ids: &[&str]) -> PaymentProofRequest {
    PaymentProofRequest {
        file_ids: ids.iter().map(|s| s.to_string()).collect(),
    }
}

/// A service over an in-memory database and the fakes.
pub(crate) struct Harness {
    pub service: PurchaseService,
    pub db: Database,
    pub catalog: Arc<FakeCatalog>,
    pub directory: Arc<FakeDirectory>,
}

pub(crate) async fn harness_with(catalog: FakeCatalog, options: ServiceOptions) -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let catalog = Arc::new(catalog);
    let directory = Arc::new(FakeDirectory::with(vec![
        seller("s-a", "Mandiri"),
        seller("s-b", "BCA"),
    ]));
    let service = PurchaseService::new(
        db.clone(),
        catalog.clone(),
        directory.clone(),
        PurchaseValidator::new(ValidationRules::default()).unwrap(),
        options,
    );
    Harness {
        service,
        db,
        catalog,
        directory,
    }
}

/// Products A (10.00) and C (2.50) from seller s-a, B (5.00) from s-b.
pub(crate) async fn harness() -> Harness {
    harness_with(
        FakeCatalog::with(vec![
            product("A", "s-a", 1000),
            product("B", "s-b", 500),
            product("C", "s-a", 250),
        ]),
        ServiceOptions::default(),
    )
    .await
}
