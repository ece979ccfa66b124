//! # Purchase Orchestrator
//!
//! Coordinates validation, the catalog and identity services, storage and
//! response assembly for the four purchase operations.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_purchase                                   │
//! │                                                                         │
//! │  Validated ──► PurchaseValidator (every field error collected)         │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Priced ────► catalog.get_products   (parallel, fail fast)             │
//! │      │        identity.get_sellers   (distinct sellers, parallel)      │
//! │      ▼                                                                  │
//! │  Persisted ─► create_full            (one transaction)                 │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Assembled ─► totalPrice + paymentDetails from the snapshots           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written until every product and seller lookup succeeded.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use lapak_core::dto::{
    CreatePurchaseRequest, MessageResponse, PaymentProofRequest, PurchaseDetailResponse,
    PurchaseListResponse, PurchaseResponse,
};
use lapak_core::validation::validate_uuid;
use lapak_core::{
    CallerId, PageRequest, ProductSnapshot, Purchase, PurchaseItem, PurchaseRecord,
    PurchaseSeller, PurchaseSender, PurchaseValidator, SellerSnapshot, ValidatedOrder,
};
use lapak_db::Database;
use lapak_upstream::{ProductCatalog, SellerDirectory, UpstreamError};

use crate::assembler;
use crate::auth::AuthContext;
use crate::services::errors::{PurchaseError, PurchaseResult};

pub const PAYMENT_PROOF_UPLOADED: &str = "Payment proof uploaded successfully";

/// Behaviour switches of the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceOptions {
    /// Decrement catalog stock for every purchased item once a payment
    /// proof has been stored.
    pub decrement_stock_on_proof: bool,
}

/// The purchase orchestrator.
pub struct PurchaseService {
    db: Database,
    catalog: Arc<dyn ProductCatalog>,
    sellers: Arc<dyn SellerDirectory>,
    validator: PurchaseValidator,
    options: ServiceOptions,
}

impl PurchaseService {
    pub fn new(
        db: Database,
        catalog: Arc<dyn ProductCatalog>,
        sellers: Arc<dyn SellerDirectory>,
        validator: PurchaseValidator,
        options: ServiceOptions,
    ) -> Self {
        PurchaseService {
            db,
            catalog,
            sellers,
            validator,
            options,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Prices, snapshots and stores a new purchase for the caller.
    #[instrument(skip_all, fields(caller = ?auth.caller, lines = request.purchased_items.len()))]
    pub async fn create_purchase(
        &self,
        auth: &AuthContext,
        request: &CreatePurchaseRequest,
    ) -> PurchaseResult<PurchaseResponse> {
        let caller = auth.require_caller()?;
        let order = self.validator.validate_create(request)?;

        let products = self.fetch_products(&order, caller).await?;
        let seller_ids = seller_ids(&order, &products)?;
        let sellers = self.fetch_sellers(&seller_ids, caller).await?;

        let record = build_record(caller, &order, &products, &seller_ids, &sellers)?;

        // Priced before the write so an unpriceable order is never stored.
        let response = assembler::purchase_response(&record)?;

        self.db
            .purchases()
            .create_full(&record)
            .await
            .map_err(PurchaseError::persistence("store purchase"))?;

        info!(
            purchase_id = %record.purchase.id,
            items = record.items.len(),
            sellers = record.sellers.len(),
            total = %response.total_price,
            "Purchase created"
        );
        Ok(response)
    }

    async fn fetch_products(
        &self,
        order: &ValidatedOrder,
        caller: &CallerId,
    ) -> PurchaseResult<HashMap<String, ProductSnapshot>> {
        self.catalog
            .get_products(&order.product_ids(), caller)
            .await
            .map_err(|err| match err {
                UpstreamError::NotFound { id, .. } => PurchaseError::ProductNotFound(id),
                other => PurchaseError::downstream("fetch products")(other),
            })
    }

    async fn fetch_sellers(
        &self,
        seller_ids: &[String],
        caller: &CallerId,
    ) -> PurchaseResult<HashMap<String, SellerSnapshot>> {
        self.sellers
            .get_sellers(seller_ids, caller)
            .await
            .map_err(|source| PurchaseError::SellerLookupFailed { source })
    }

    // =========================================================================
    // Payment Proof
    // =========================================================================

    /// Attaches payment proof file ids to one of the caller's purchases.
    ///
    /// The stored list is replaced, not appended to. Prices are not touched.
    #[instrument(skip_all, fields(caller = ?auth.caller, purchase_id = %purchase_id))]
    pub async fn upload_payment_proof(
        &self,
        auth: &AuthContext,
        purchase_id: &str,
        request: &PaymentProofRequest,
    ) -> PurchaseResult<MessageResponse> {
        let caller = auth.require_caller()?;
        let file_ids = self.validator.validate_payment_proof(request)?;
        let id = parse_purchase_id(purchase_id)?;

        let repo = self.db.purchases();
        let purchase = repo
            .get_by_id(&id)
            .await
            .map_err(PurchaseError::persistence("load purchase"))?
            .ok_or_else(|| PurchaseError::PurchaseNotFound(id.clone()))?;
        ensure_owner(&purchase, caller)?;
        let first_proof = purchase.payment_proof_ids.is_empty();

        repo.update_payment_proof(&id, caller.as_str(), &file_ids, Utc::now())
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    PurchaseError::PurchaseNotFound(id.clone())
                } else {
                    PurchaseError::persistence("store payment proof")(err)
                }
            })?;

        info!(purchase_id = %id, files = file_ids.len(), "Payment proof attached");

        // Stock leaves the catalog once per purchase, not per re-upload.
        if self.options.decrement_stock_on_proof && first_proof {
            self.decrement_stock(&id, caller).await?;
        }

        Ok(MessageResponse::new(PAYMENT_PROOF_UPLOADED))
    }

    /// Lowers catalog stock by the purchased quantities, one item at a time.
    async fn decrement_stock(&self, purchase_id: &str, caller: &CallerId) -> PurchaseResult<()> {
        let items = self
            .db
            .purchases()
            .get_items(purchase_id)
            .await
            .map_err(PurchaseError::persistence("load purchase items"))?;

        for item in &items {
            self.catalog
                .decrease_quantity(&item.product_id, item.qty, caller)
                .await
                .map_err(PurchaseError::downstream("decrease stock"))?;
        }

        debug!(purchase_id = %purchase_id, items = items.len(), "Catalog stock decremented");
        Ok(())
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// One of the caller's purchases, rendered from its snapshots.
    #[instrument(skip_all, fields(caller = ?auth.caller, purchase_id = %purchase_id))]
    pub async fn get_purchase(
        &self,
        auth: &AuthContext,
        purchase_id: &str,
    ) -> PurchaseResult<PurchaseDetailResponse> {
        let caller = auth.require_caller()?;
        let id = parse_purchase_id(purchase_id)?;

        let record = self
            .db
            .purchases()
            .get_record(&id)
            .await
            .map_err(PurchaseError::persistence("load purchase"))?
            .ok_or(PurchaseError::PurchaseNotFound(id))?;
        ensure_owner(&record.purchase, caller)?;

        Ok(assembler::detail_response(&record)?)
    }

    /// A page of the caller's purchases, newest first.
    #[instrument(skip_all, fields(caller = ?auth.caller, page = page.page(), limit = page.limit()))]
    pub async fn list_purchases(
        &self,
        auth: &AuthContext,
        page: PageRequest,
    ) -> PurchaseResult<PurchaseListResponse> {
        let caller = auth.require_caller()?;
        let repo = self.db.purchases();

        let (purchases, total) = repo
            .list_by_user(caller.as_str(), page)
            .await
            .map_err(PurchaseError::persistence("list purchases"))?;

        let mut rendered = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let record = repo
                .load_record(purchase)
                .await
                .map_err(PurchaseError::persistence("load purchase"))?;
            rendered.push(assembler::detail_response(&record)?);
        }

        Ok(PurchaseListResponse {
            purchases: rendered,
            total,
            page: page.page(),
            limit: page.limit(),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Canonical (lowercase, hyphenated) form of a purchase id.
fn parse_purchase_id(raw: &str) -> PurchaseResult<String> {
    validate_uuid(raw, "purchaseId")
        .map(|id| id.to_string())
        .map_err(|_| PurchaseError::InvalidPurchaseId(raw.to_string()))
}

fn ensure_owner(purchase: &Purchase, caller: &CallerId) -> PurchaseResult<()> {
    if purchase.is_owned_by(caller) {
        Ok(())
    } else {
        warn!(purchase_id = %purchase.id, caller = %caller, "Caller does not own purchase");
        Err(PurchaseError::Forbidden {
            purchase_id: purchase.id.clone(),
        })
    }
}

fn product_for<'a>(
    products: &'a HashMap<String, ProductSnapshot>,
    product_id: &str,
) -> PurchaseResult<&'a ProductSnapshot> {
    products
        .get(product_id)
        .ok_or_else(|| PurchaseError::ProductNotFound(product_id.to_string()))
}

/// Distinct seller ids of the ordered products, sorted.
fn seller_ids(
    order: &ValidatedOrder,
    products: &HashMap<String, ProductSnapshot>,
) -> PurchaseResult<Vec<String>> {
    let mut ids = BTreeSet::new();
    for line in &order.lines {
        ids.insert(product_for(products, &line.product_id)?.seller_id.clone());
    }
    Ok(ids.into_iter().collect())
}

fn build_record(
    caller: &CallerId,
    order: &ValidatedOrder,
    products: &HashMap<String, ProductSnapshot>,
    seller_ids: &[String],
    sellers: &HashMap<String, SellerSnapshot>,
) -> PurchaseResult<PurchaseRecord> {
    let now = Utc::now();
    let purchase = Purchase::new(caller, now);

    let items = order
        .lines
        .iter()
        .map(|line| {
            let product = product_for(products, &line.product_id)?;
            Ok(PurchaseItem::snapshot(&purchase.id, product, line.qty, now))
        })
        .collect::<PurchaseResult<Vec<_>>>()?;

    let sellers = seller_ids
        .iter()
        .map(|seller_id| {
            let seller = sellers
                .get(seller_id)
                .ok_or_else(|| PurchaseError::SellerLookupFailed {
                    source: UpstreamError::not_found("seller", seller_id.as_str()),
                })?;
            Ok(PurchaseSeller::snapshot(&purchase.id, seller_id, seller, now))
        })
        .collect::<PurchaseResult<Vec<_>>>()?;

    let sender = PurchaseSender::new(&purchase.id, &order.sender, now);

    Ok(PurchaseRecord {
        purchase,
        items,
        sender,
        sellers,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buyer, harness, harness_with, order, product, proof, FakeCatalog};
    use lapak_core::Money;

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_two_sellers() {
        let h = harness().await;

        let response = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 2), ("B", 1)]))
            .await
            .unwrap();

        assert_eq!(response.total_price, Money::from_cents(2500));
        assert_eq!(response.purchased_items.len(), 2);
        assert_eq!(response.purchased_items[0].qty, 2);

        let rows: Vec<_> = response
            .payment_details
            .iter()
            .map(|d| (d.bank_account_name.as_str(), d.total_price.cents()))
            .collect();
        assert_eq!(rows, vec![("BCA", 500), ("Mandiri", 2000)]);

        let sum: i64 = response
            .payment_details
            .iter()
            .map(|d| d.total_price.cents())
            .sum();
        assert_eq!(sum, response.total_price.cents());
    }

    #[tokio::test]
    async fn test_create_looks_up_each_seller_once() {
        let h = harness().await;

        let response = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 1), ("C", 3)]))
            .await
            .unwrap();

        assert_eq!(response.payment_details.len(), 1);
        assert_eq!(response.payment_details[0].total_price.cents(), 1750);
        assert_eq!(
            *h.directory.requested.lock().unwrap(),
            vec![vec!["s-a".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_create_keeps_duplicate_lines() {
        let h = harness().await;

        let response = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 1), ("A", 2)]))
            .await
            .unwrap();

        assert_eq!(response.purchased_items.len(), 2);
        assert_eq!(response.total_price.cents(), 3000);
    }

    #[tokio::test]
    async fn test_create_requires_caller() {
        let h = harness().await;

        let err = h
            .service
            .create_purchase(&AuthContext::anonymous(), &order(&[("A", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::Unauthenticated));
        assert_eq!(*h.catalog.lookups.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_validation_collects_fields() {
        let h = harness().await;
        let mut request = order(&[("", 0)]);
        request.sender_name = "Bo".to_string();
        request.sender_contact_type = "email".to_string();
        request.sender_contact_detail = "not-an-email".to_string();

        let err = h
            .service
            .create_purchase(&buyer("u-1"), &request)
            .await
            .unwrap_err();

        match err {
            PurchaseError::Validation(errors) => {
                let fields = errors.by_field();
                assert!(fields.contains_key("purchasedItems[0].productId"));
                assert!(fields.contains_key("purchasedItems[0].qty"));
                assert!(fields.contains_key("senderName"));
                assert!(fields.contains_key("senderContactDetail"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(*h.catalog.lookups.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_missing_product_persists_nothing() {
        let h = harness().await;

        let err = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 1), ("ZZZ", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::ProductNotFound(ref id) if id == "ZZZ"));
        assert_eq!(h.db.purchases().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_unknown_seller_persists_nothing() {
        let h = harness_with(
            FakeCatalog::with(vec![product("X", "s-ghost", 100)]),
            ServiceOptions::default(),
        )
        .await;

        let err = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("X", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::SellerLookupFailed { .. }));
        assert_eq!(h.db.purchases().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_catalog_outage_is_downstream_error() {
        let h = harness_with(FakeCatalog::failing(503), ServiceOptions::default()).await;

        let err = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PurchaseError::DownstreamUnavailable {
                step: "fetch products",
                ..
            }
        ));
        assert_eq!(h.db.purchases().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_quantity_above_cap() {
        let h = harness().await;

        let err = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", i64::MAX / 10)]))
            .await
            .unwrap_err();

        match err {
            PurchaseError::Validation(errors) => {
                assert!(errors.by_field().contains_key("purchasedItems[0].qty"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(*h.catalog.lookups.lock().unwrap(), 0);
        assert_eq!(h.db.purchases().count().await.unwrap(), 0);
    }

    // -------------------------------------------------------------------------
    // Get / List
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_uses_snapshot_price_after_catalog_change() {
        let h = harness().await;
        let caller = buyer("u-1");
        let created = h
            .service
            .create_purchase(&caller, &order(&[("A", 2), ("B", 1)]))
            .await
            .unwrap();

        h.catalog.set_price("A", 99_900);

        let first = h
            .service
            .get_purchase(&caller, &created.purchase_id)
            .await
            .unwrap();
        let second = h
            .service
            .get_purchase(&caller, &created.purchase_id)
            .await
            .unwrap();

        assert_eq!(first.total_price, Money::from_cents(2500));
        assert_eq!(first.payment_details, created.payment_details);
        assert_eq!(first.user_id, "u-1");
        assert_eq!(first.sender_info.sender_name, "Budi Santoso");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_accepts_uppercase_id() {
        let h = harness().await;
        let caller = buyer("u-1");
        let created = h
            .service
            .create_purchase(&caller, &order(&[("A", 1)]))
            .await
            .unwrap();

        let detail = h
            .service
            .get_purchase(&caller, &created.purchase_id.to_uppercase())
            .await
            .unwrap();
        assert_eq!(detail.purchase_id, created.purchase_id);
    }

    #[tokio::test]
    async fn test_get_other_users_purchase_is_forbidden() {
        let h = harness().await;
        let created = h
            .service
            .create_purchase(&buyer("u-1"), &order(&[("A", 1)]))
            .await
            .unwrap();

        let err = h
            .service
            .get_purchase(&buyer("u-2"), &created.purchase_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_get_invalid_and_unknown_ids() {
        let h = harness().await;

        let err = h
            .service
            .get_purchase(&buyer("u-1"), "not-a-uuid")
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::InvalidPurchaseId(_)));

        let err = h
            .service
            .get_purchase(&buyer("u-1"), "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b")
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::PurchaseNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_clamped() {
        let h = harness().await;
        let mine = buyer("u-1");
        for _ in 0..3 {
            h.service
                .create_purchase(&mine, &order(&[("A", 1)]))
                .await
                .unwrap();
        }
        h.service
            .create_purchase(&buyer("u-2"), &order(&[("B", 1)]))
            .await
            .unwrap();

        let page = h
            .service
            .list_purchases(&mine, PageRequest::clamped(Some(0), Some(0)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.purchases.len(), 3);
        assert!(page.purchases.iter().all(|p| p.user_id == "u-1"));

        let page = h
            .service
            .list_purchases(&mine, PageRequest::clamped(Some(2), Some(500)))
            .await
            .unwrap();
        assert_eq!(page.limit, 100);
        assert!(page.purchases.is_empty());
        assert_eq!(page.total, 3);

        let page = h
            .service
            .list_purchases(&mine, PageRequest::clamped(Some(-4), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.purchases.len(), 2);
    }

    // -------------------------------------------------------------------------
    // Payment Proof
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_upload_payment_proof_replaces_ids() {
        let h = harness().await;
        let caller = buyer("u-1");
        let created = h
            .service
            .create_purchase(&caller, &order(&[("A", 1)]))
            .await
            .unwrap();

        for ids in [&["f-1", "f-2"][..], &["f-3"][..]] {
            let message = h
                .service
                .upload_payment_proof(&caller, &created.purchase_id, &proof(ids))
                .await
                .unwrap();
            assert_eq!(message.message, PAYMENT_PROOF_UPLOADED);
        }

        let detail = h
            .service
            .get_purchase(&caller, &created.purchase_id)
            .await
            .unwrap();
        assert_eq!(detail.payment_proof_ids, vec!["f-3".to_string()]);
        assert_eq!(detail.total_price, created.total_price);
        assert!(h.catalog.decrements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_by_non_owner_leaves_proof_unchanged() {
        let h = harness().await;
        let owner = buyer("u-1");
        let created = h
            .service
            .create_purchase(&owner, &order(&[("A", 1)]))
            .await
            .unwrap();
        h.service
            .upload_payment_proof(&owner, &created.purchase_id, &proof(&["f-1"]))
            .await
            .unwrap();

        let err = h
            .service
            .upload_payment_proof(&buyer("u-2"), &created.purchase_id, &proof(&["evil"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::Forbidden { .. }));

        let detail = h
            .service
            .get_purchase(&owner, &created.purchase_id)
            .await
            .unwrap();
        assert_eq!(detail.payment_proof_ids, vec!["f-1".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file_list() {
        let h = harness().await;
        let caller = buyer("u-1");
        let created = h
            .service
            .create_purchase(&caller, &order(&[("A", 1)]))
            .await
            .unwrap();

        let err = h
            .service
            .upload_payment_proof(&caller, &created.purchase_id, &proof(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::Validation(_)));

        let err = h
            .service
            .upload_payment_proof(&caller, "nope", &proof(&["f-1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::InvalidPurchaseId(_)));
    }

    #[tokio::test]
    async fn test_upload_decrements_stock_when_enabled() {
        let h = harness_with(
            FakeCatalog::with(vec![product("A", "s-a", 1000), product("B", "s-b", 500)]),
            ServiceOptions {
                decrement_stock_on_proof: true,
            },
        )
        .await;
        let caller = buyer("u-1");
        let created = h
            .service
            .create_purchase(&caller, &order(&[("A", 2), ("B", 5)]))
            .await
            .unwrap();

        for file in ["f-1", "f-2", "f-3"] {
            h.service
                .upload_payment_proof(&caller, &created.purchase_id, &proof(&[file]))
                .await
                .unwrap();
        }

        let decrements = h.catalog.decrements.lock().unwrap().clone();
        assert_eq!(decrements, vec![("A".to_string(), 2), ("B".to_string(), 5)]);

        let detail = h
            .service
            .get_purchase(&caller, &created.purchase_id)
            .await
            .unwrap();
        assert_eq!(detail.payment_proof_ids, vec!["f-3"]);
    }
}
