//! # Domain Types
//!
//! Core domain types of the purchase service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         PurchaseRecord                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Purchase     │   │  PurchaseItem   │   │ PurchaseSeller  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID v7)   │◄──│  purchase_id    │   │  purchase_id    │       │
//! │  │  user_id        │   │  product_id     │   │  seller_id      │       │
//! │  │  proof ids      │   │  seller_id ─────┼──►│  bank account   │       │
//! │  └─────────────────┘   │  unit price     │   └─────────────────┘       │
//! │          ▲             │  qty            │                              │
//! │          │             └─────────────────┘                              │
//! │  ┌───────┴─────────┐                                                    │
//! │  │ PurchaseSender  │   Everything except the proof ids is frozen at    │
//! │  │  name, contact  │   creation time.                                  │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Items and sellers copy what the catalog and identity services said at
//! purchase time. Later catalog edits never change a stored purchase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{major_units, Money};
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Caller Identity
// =============================================================================

/// The authenticated end user a request acts for.
///
/// Produced by the inbound trust edge and forwarded on every upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Returns `None` for a blank id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(CallerId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Contact Type
// =============================================================================

/// How the seller can reach the sender about a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Phone,
}

impl ContactType {
    pub const ALL: [ContactType; 2] = [ContactType::Email, ContactType::Phone];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Email => "email",
            ContactType::Phone => "phone",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactType::Email),
            "phone" => Ok(ContactType::Phone),
            other => Err(format!("unknown contact type '{other}'")),
        }
    }
}

// =============================================================================
// Upstream Snapshots
// =============================================================================

/// A product as the catalog service reports it right now.
///
/// Transient: only its copy inside a [`PurchaseItem`] is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Stock on hand. Never copied into a purchase.
    #[serde(rename = "qty", default)]
    pub stock: i64,
    #[serde(with = "major_units")]
    pub price: Money,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub file_uri: String,
    #[serde(default)]
    pub file_thumbnail_uri: String,
    pub seller_id: String,
}

/// A seller's payout details as the identity service reports them right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSnapshot {
    pub id: String,
    #[serde(default)]
    pub bank_account_name: String,
    #[serde(default)]
    pub bank_account_holder: String,
    #[serde(default)]
    pub bank_account_number: String,
}

// =============================================================================
// Validated Input
// =============================================================================

/// One validated line of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub qty: i64,
}

/// Validated sender block of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderDetails {
    pub name: String,
    pub contact_type: ContactType,
    pub contact_detail: String,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub lines: Vec<OrderLine>,
    pub sender: SenderDetails,
}

impl ValidatedOrder {
    /// Product ids in request order, duplicates kept.
    pub fn product_ids(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.product_id.clone()).collect()
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Purchase header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// UUID v7, so ids sort like creation time.
    pub id: String,
    /// Owner. Set once at creation, never reassigned.
    pub user_id: String,
    /// File ids of the uploaded payment proof, `[]` until one is attached.
    pub payment_proof_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(owner: &CallerId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: owner.as_str().to_string(),
            payment_proof_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, caller: &CallerId) -> bool {
        self.user_id == caller.as_str()
    }
}

// =============================================================================
// Purchase Item
// =============================================================================

/// A purchased line, frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    /// Seller of the product at purchase time.
    pub seller_id: String,
    pub name: String,
    pub category: String,
    /// Requested quantity (not the catalog's stock level).
    pub qty: i64,
    pub unit_price_cents: i64,
    pub sku: String,
    pub file_id: String,
    pub file_uri: String,
    pub file_thumbnail_uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseItem {
    /// Copies the commercial fields of `product` for a line of `qty` units.
    pub fn snapshot(
        purchase_id: &str,
        product: &ProductSnapshot,
        qty: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            purchase_id: purchase_id.to_string(),
            product_id: product.product_id.clone(),
            seller_id: product.seller_id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            qty,
            unit_price_cents: product.price.cents(),
            sku: product.sku.clone(),
            file_id: product.file_id.clone(),
            file_uri: product.file_uri.clone(),
            file_thumbnail_uri: product.file_thumbnail_uri.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Purchase Sender
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseSender {
    pub id: String,
    pub purchase_id: String,
    pub sender_name: String,
    pub contact_type: ContactType,
    pub contact_detail: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseSender {
    pub fn new(purchase_id: &str, details: &SenderDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            purchase_id: purchase_id.to_string(),
            sender_name: details.name.clone(),
            contact_type: details.contact_type,
            contact_detail: details.contact_detail.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Purchase Seller
// =============================================================================

/// Payout details of one seller, frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseSeller {
    pub purchase_id: String,
    pub seller_id: String,
    pub bank_account_name: String,
    pub bank_account_holder: String,
    pub bank_account_number: String,
    pub created_at: DateTime<Utc>,
}

impl PurchaseSeller {
    pub fn snapshot(
        purchase_id: &str,
        seller_id: &str,
        seller: &SellerSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            purchase_id: purchase_id.to_string(),
            seller_id: seller_id.to_string(),
            bank_account_name: seller.bank_account_name.clone(),
            bank_account_holder: seller.bank_account_holder.clone(),
            bank_account_number: seller.bank_account_number.clone(),
            created_at: now,
        }
    }
}

// =============================================================================
// Purchase Record
// =============================================================================

/// A purchase with everything stored alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
    pub sender: PurchaseSender,
    pub sellers: Vec<PurchaseSeller>,
}

// =============================================================================
// Pagination
// =============================================================================

/// A page request with the bounds already applied.
///
/// ## Clamping
/// ```text
/// page  : missing, 0, negative      → 1
/// limit : missing, 0, negative      → DEFAULT_PAGE_LIMIT (10)
/// limit : above MAX_PAGE_LIMIT      → MAX_PAGE_LIMIT (100)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        let limit = match limit {
            Some(l) if l > i64::from(MAX_PAGE_LIMIT) => MAX_PAGE_LIMIT,
            Some(l) if l >= 1 => l as u32,
            _ => DEFAULT_PAGE_LIMIT,
        };
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
