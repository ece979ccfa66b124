//! # Pricing
//!
//! Order totals and the per-seller payment breakdown.
//!
//! The same functions run at create time (on freshly built snapshots) and
//! at read time (on stored snapshots), so a purchase always reports the
//! numbers it was created with.
//!
//! ```text
//!  items                            sellers (bank snapshots)
//!  ┌──────────────┬────┬──────┐     ┌────────┬────────────────────┐
//!  │ product  sel │ qty│ unit │     │ seller │ bank account name  │
//!  ├──────────────┼────┼──────┤     ├────────┼────────────────────┤
//!  │ A        s-1 │  2 │10.00 │     │ s-1    │ BCA                │
//!  │ B        s-2 │  1 │ 5.00 │     │ s-2    │ Mandiri            │
//!  └──────────────┴────┴──────┘     └────────┴────────────────────┘
//!            │                                │
//!            └──────────────┬─────────────────┘
//!                           ▼
//!     total 25.00   rows: BCA 20.00, Mandiri 5.00  (sorted by bank name)
//! ```

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PurchaseItem, PurchaseSeller};

/// What the buyer owes one seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerTotal {
    pub seller_id: String,
    pub bank_account_name: String,
    pub bank_account_holder: String,
    pub bank_account_number: String,
    pub total: Money,
}

/// `unit price × requested quantity` for one item.
pub fn line_total(item: &PurchaseItem) -> CoreResult<Money> {
    item.unit_price()
        .checked_mul_quantity(item.qty)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: format!("line for product {}", item.product_id),
        })
}

/// Sum of all line totals.
pub fn order_total(items: &[PurchaseItem]) -> CoreResult<Money> {
    items.iter().try_fold(Money::zero(), |total, item| {
        total
            .checked_add(line_total(item)?)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "order total".to_string(),
            })
    })
}

/// One row per distinct seller of `items`, sorted by bank account name
/// (seller id breaks ties).
///
/// Every seller referenced by an item must have a snapshot in `sellers`.
/// The row totals always sum to [`order_total`].
pub fn seller_totals(
    items: &[PurchaseItem],
    sellers: &[PurchaseSeller],
) -> CoreResult<Vec<SellerTotal>> {
    let mut per_seller: BTreeMap<&str, Money> = BTreeMap::new();
    for item in items {
        let line = line_total(item)?;
        let total = per_seller.entry(item.seller_id.as_str()).or_default();
        *total = total
            .checked_add(line)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("total for seller {}", item.seller_id),
            })?;
    }

    let mut rows = per_seller
        .into_iter()
        .map(|(seller_id, total)| {
            let seller = sellers
                .iter()
                .find(|s| s.seller_id == seller_id)
                .ok_or_else(|| CoreError::SellerSnapshotMissing {
                    seller_id: seller_id.to_string(),
                })?;
            Ok(SellerTotal {
                seller_id: seller_id.to_string(),
                bank_account_name: seller.bank_account_name.clone(),
                bank_account_holder: seller.bank_account_holder.clone(),
                bank_account_number: seller.bank_account_number.clone(),
                total,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    rows.sort_by(|a, b| {
        a.bank_account_name
            .cmp(&b.bank_account_name)
            .then_with(|| a.seller_id.cmp(&b.seller_id))
    });
    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================
