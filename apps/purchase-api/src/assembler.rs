//! # Response Assembler
//!
//! Turns stored snapshots into wire responses. Totals and the per-seller
//! payment breakdown are always computed from the snapshots, never from
//! live catalog or identity data, so the same record always renders the
//! same way.
//!
//! ```text
//! PurchaseRecord ──► items    ──► purchasedItems[]
//!                ──► pricing::order_total   ──► totalPrice
//!                ──► pricing::seller_totals ──► paymentDetails[] (by bank name)
//!                ──► sender   ──► senderInfo
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

use lapak_core::dto::{
    PaymentDetailResponse, PurchaseDetailResponse, PurchaseResponse, PurchasedItemResponse,
    SenderInfoResponse,
};
use lapak_core::pricing::{order_total, seller_totals};
use lapak_core::{CoreResult, PurchaseItem, PurchaseRecord, PurchaseSeller};

/// Body returned by a successful create.
pub fn purchase_response(record: &PurchaseRecord) -> CoreResult<PurchaseResponse> {
    Ok(PurchaseResponse {
        purchase_id: record.purchase.id.clone(),
        purchased_items: record.items.iter().map(item_response).collect(),
        total_price: order_total(&record.items)?,
        payment_details: payment_details(&record.items, &record.sellers)?,
    })
}

/// Full view of a stored purchase.
pub fn detail_response(record: &PurchaseRecord) -> CoreResult<PurchaseDetailResponse> {
    let purchase = &record.purchase;
    Ok(PurchaseDetailResponse {
        purchase_id: purchase.id.clone(),
        user_id: purchase.user_id.clone(),
        payment_proof_ids: purchase.payment_proof_ids.clone(),
        purchased_items: record.items.iter().map(item_response).collect(),
        total_price: order_total(&record.items)?,
        payment_details: payment_details(&record.items, &record.sellers)?,
        sender_info: SenderInfoResponse {
            sender_name: record.sender.sender_name.clone(),
            sender_contact_type: record.sender.contact_type,
            sender_contact_detail: record.sender.contact_detail.clone(),
        },
        created_at: timestamp(&purchase.created_at),
        updated_at: timestamp(&purchase.updated_at),
    })
}

fn item_response(item: &PurchaseItem) -> PurchasedItemResponse {
    PurchasedItemResponse {
        product_id: item.product_id.clone(),
        name: item.name.clone(),
        category: item.category.clone(),
        qty: item.qty,
        price: item.unit_price(),
        sku: item.sku.clone(),
        file_id: item.file_id.clone(),
        file_uri: item.file_uri.clone(),
        file_thumbnail_uri: item.file_thumbnail_uri.clone(),
        created_at: timestamp(&item.created_at),
        updated_at: timestamp(&item.updated_at),
    }
}

fn payment_details(
    items: &[PurchaseItem],
    sellers: &[PurchaseSeller],
) -> CoreResult<Vec<PaymentDetailResponse>> {
    Ok(seller_totals(items, sellers)?
        .into_iter()
        .map(|row| PaymentDetailResponse {
            bank_account_name: row.bank_account_name,
            bank_account_holder: row.bank_account_holder,
            bank_account_number: row.bank_account_number,
            total_price: row.total,
        })
        .collect())
}

/// RFC 3339, millisecond precision, `Z` suffix.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lapak_core::{
        CallerId, ContactType, Money, ProductSnapshot, Purchase, PurchaseSender, SellerSnapshot,
        SenderDetails,
    };

    fn product(id: &str, seller: &str, cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            category: "snacks".to_string(),
            stock: 99,
            price: Money::from_cents(cents),
            sku: format!("SKU-{id}"),
            file_id: String::new(),
            file_uri: String::new(),
            file_thumbnail_uri: String::new(),
            seller_id: seller.to_string(),
        }
    }

    fn bank(id: &str, name: &str) -> SellerSnapshot {
        SellerSnapshot {
            id: id.to_string(),
            bank_account_name: name.to_string(),
            bank_account_holder: format!("Holder {id}"),
            bank_account_number: format!("000-{id}"),
        }
    }

    fn record() -> PurchaseRecord {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let caller = CallerId::new("buyer-1").unwrap();
        let purchase = Purchase::new(&caller, now);
        let id = purchase.id.clone();

        PurchaseRecord {
            items: vec![
                PurchaseItem::snapshot(&id, &product("a", "s-2", 1000), 2, now),
                PurchaseItem::snapshot(&id, &product("b", "s-1", 500), 1, now),
            ],
            sellers: vec![
                PurchaseSeller::snapshot(&id, "s-2", &bank("s-2", "Mandiri"), now),
                PurchaseSeller::snapshot(&id, "s-1", &bank("s-1", "BCA"), now),
            ],
            sender: PurchaseSender::new(
                &id,
                &SenderDetails {
                    name: "Budi Santoso".to_string(),
                    contact_type: ContactType::Email,
                    contact_detail: "budi@example.com".to_string(),
                },
                now,
            ),
            purchase,
        }
    }

    #[test]
    fn test_purchase_response_totals_and_breakdown() {
        let response = purchase_response(&record()).unwrap();

        assert_eq!(response.total_price, Money::from_cents(2500));
        assert_eq!(response.purchased_items.len(), 2);
        assert_eq!(response.purchased_items[0].qty, 2);
        assert_eq!(response.purchased_items[0].price, Money::from_cents(1000));

        let rows: Vec<_> = response
            .payment_details
            .iter()
            .map(|d| (d.bank_account_name.as_str(), d.total_price.cents()))
            .collect();
        assert_eq!(rows, vec![("BCA", 500), ("Mandiri", 2000)]);
    }

    #[test]
    fn test_detail_response_wire_shape() {
        let detail = detail_response(&record()).unwrap();
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["userId"], "buyer-1");
        assert_eq!(json["totalPrice"], 25.0);
        assert_eq!(json["paymentProofIds"], serde_json::json!([]));
        assert_eq!(json["senderInfo"]["senderContactType"], "email");
        assert_eq!(json["createdAt"], "2024-05-01T08:30:00.000Z");
        assert_eq!(json["purchasedItems"][1]["price"], 5.0);
        assert_eq!(json["paymentDetails"][0]["bankAccountNumber"], "000-s-1");
    }

    #[test]
    fn test_missing_seller_snapshot_is_an_error() {
        let mut record = record();
        record.sellers.pop();
        assert!(detail_response(&record).is_err());
    }
}
