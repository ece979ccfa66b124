//! # Wire Shapes
//!
//! JSON bodies of the public purchase API (camelCase). Requests default
//! every field so a missing field becomes a field-level validation error
//! instead of an opaque parse failure.
//!
//! ```text
//! POST /api/v1/purchase              CreatePurchaseRequest → PurchaseResponse
//! POST /api/v1/purchase/{id}         PaymentProofRequest   → MessageResponse
//! GET  /api/v1/purchase/{id}                               → PurchaseDetailResponse
//! GET  /api/v1/purchase?page&limit                         → PurchaseListResponse
//! ```

use serde::{Deserialize, Serialize};

use crate::money::{major_units, Money};
use crate::types::ContactType;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePurchaseRequest {
    pub purchased_items: Vec<PurchaseItemRequest>,
    pub sender_name: String,
    pub sender_contact_type: String,
    pub sender_contact_detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseItemRequest {
    pub product_id: String,
    pub qty: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentProofRequest {
    pub file_ids: Vec<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Frozen line of a purchase as shown to the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedItemResponse {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub qty: i64,
    #[serde(with = "major_units")]
    pub price: Money,
    pub sku: String,
    pub file_id: String,
    pub file_uri: String,
    pub file_thumbnail_uri: String,
    pub created_at: String,
    pub updated_at: String,
}

/// What the buyer owes one seller, and where to send it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailResponse {
    pub bank_account_name: String,
    pub bank_account_holder: String,
    pub bank_account_number: String,
    #[serde(with = "major_units")]
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfoResponse {
    pub sender_name: String,
    pub sender_contact_type: ContactType,
    pub sender_contact_detail: String,
}

/// Body of a successful create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub purchase_id: String,
    pub purchased_items: Vec<PurchasedItemResponse>,
    #[serde(with = "major_units")]
    pub total_price: Money,
    pub payment_details: Vec<PaymentDetailResponse>,
}

/// A stored purchase, as returned by get and list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetailResponse {
    pub purchase_id: String,
    pub user_id: String,
    pub payment_proof_ids: Vec<String>,
    pub purchased_items: Vec<PurchasedItemResponse>,
    #[serde(with = "major_units")]
    pub total_price: Money,
    pub payment_details: Vec<PaymentDetailResponse>,
    pub sender_info: SenderInfoResponse,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseDetailResponse>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
