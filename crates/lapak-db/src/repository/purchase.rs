//! # Purchase Repository
//!
//! Storage of purchases and their snapshots.
//!
//! ## Atomic Creation
//! ```text
//! BEGIN
//!   INSERT purchases          (header first: children reference it)
//!   INSERT purchase_items     × N
//!   INSERT purchase_sellers   × K
//!   INSERT purchase_senders
//! COMMIT   ← any failure before this drops the transaction = ROLLBACK
//! ```
//! Readers never observe a header without its items, sender or sellers.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use lapak_core::{
    PageRequest, Purchase, PurchaseItem, PurchaseRecord, PurchaseSeller, PurchaseSender,
};

use crate::error::{DbError, DbResult};

/// Row shape of the `purchases` table; proof ids are a JSON array.
#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: String,
    user_id: String,
    payment_proof_ids: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self) -> Purchase {
        let payment_proof_ids = decode_proof_ids(&self.id, &self.payment_proof_ids);
        Purchase {
            id: self.id,
            user_id: self.user_id,
            payment_proof_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// An unreadable proof list reads as empty rather than failing the purchase.
fn decode_proof_ids(purchase_id: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(
                purchase_id = %purchase_id,
                error = %e,
                "Unreadable payment proof ids, treating as empty"
            );
            Vec::new()
        }
    }
}

fn encode_proof_ids(purchase_id: &str, ids: &[String]) -> DbResult<String> {
    serde_json::to_string(ids).map_err(|e| DbError::Corrupt {
        entity: "purchase".to_string(),
        id: purchase_id.to_string(),
        reason: e.to_string(),
    })
}

const SELECT_PURCHASE: &str = r#"
    SELECT id, user_id, payment_proof_ids, created_at, updated_at
    FROM purchases
"#;

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Writes a purchase with its items, sellers and sender in one
    /// transaction. Either every row lands or none does.
    pub async fn create_full(&self, record: &PurchaseRecord) -> DbResult<()> {
        let purchase = &record.purchase;
        debug!(
            id = %purchase.id,
            user_id = %purchase.user_id,
            items = record.items.len(),
            sellers = record.sellers.len(),
            "Creating purchase"
        );

        let proof_ids = encode_proof_ids(&purchase.id, &purchase.payment_proof_ids)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::at_step("begin", e))?;

        sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, payment_proof_ids, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.user_id)
        .bind(&proof_ids)
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::at_step("insert purchase", e))?;

        for item in &record.items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    id, purchase_id, product_id, seller_id,
                    name, category, qty, unit_price_cents,
                    sku, file_id, file_uri, file_thumbnail_uri,
                    created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4,
                    ?5, ?6, ?7, ?8,
                    ?9, ?10, ?11, ?12,
                    ?13, ?14
                )
                "#,
            )
            .bind(&item.id)
            .bind(&item.purchase_id)
            .bind(&item.product_id)
            .bind(&item.seller_id)
            .bind(&item.name)
            .bind(&item.category)
            .bind(item.qty)
            .bind(item.unit_price_cents)
            .bind(&item.sku)
            .bind(&item.file_id)
            .bind(&item.file_uri)
            .bind(&item.file_thumbnail_uri)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::at_step("insert purchase items", e))?;
        }

        for seller in &record.sellers {
            sqlx::query(
                r#"
                INSERT INTO purchase_sellers (
                    purchase_id, seller_id,
                    bank_account_name, bank_account_holder, bank_account_number,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&seller.purchase_id)
            .bind(&seller.seller_id)
            .bind(&seller.bank_account_name)
            .bind(&seller.bank_account_holder)
            .bind(&seller.bank_account_number)
            .bind(seller.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::at_step("insert purchase sellers", e))?;
        }

        let sender = &record.sender;
        sqlx::query(
            r#"
            INSERT INTO purchase_senders (
                id, purchase_id, sender_name, contact_type, contact_detail,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sender.id)
        .bind(&sender.purchase_id)
        .bind(&sender.sender_name)
        .bind(sender.contact_type)
        .bind(&sender.contact_detail)
        .bind(sender.created_at)
        .bind(sender.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::at_step("insert purchase sender", e))?;

        tx.commit()
            .await
            .map_err(|e| DbError::at_step("commit", e))?;

        Ok(())
    }

    /// Gets a purchase header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!("{SELECT_PURCHASE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PurchaseRow::into_purchase))
    }

    /// Items of a purchase, in insertion order.
    pub async fn get_items(&self, purchase_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT
                id, purchase_id, product_id, seller_id,
                name, category, qty, unit_price_cents,
                sku, file_id, file_uri, file_thumbnail_uri,
                created_at, updated_at
            FROM purchase_items
            WHERE purchase_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_sender(&self, purchase_id: &str) -> DbResult<Option<PurchaseSender>> {
        let sender = sqlx::query_as::<_, PurchaseSender>(
            r#"
            SELECT id, purchase_id, sender_name, contact_type, contact_detail,
                   created_at, updated_at
            FROM purchase_senders
            WHERE purchase_id = ?1
            "#,
        )
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sender)
    }

    pub async fn get_sellers(&self, purchase_id: &str) -> DbResult<Vec<PurchaseSeller>> {
        let sellers = sqlx::query_as::<_, PurchaseSeller>(
            r#"
            SELECT purchase_id, seller_id,
                   bank_account_name, bank_account_holder, bank_account_number,
                   created_at
            FROM purchase_sellers
            WHERE purchase_id = ?1
            ORDER BY seller_id
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sellers)
    }

    /// Loads everything stored alongside `purchase`.
    ///
    /// A purchase without a sender can only come from a partial write,
    /// which `create_full` rules out, so it is reported as corrupt.
    pub async fn load_record(&self, purchase: Purchase) -> DbResult<PurchaseRecord> {
        let items = self.get_items(&purchase.id).await?;
        let sellers = self.get_sellers(&purchase.id).await?;
        let sender = self
            .get_sender(&purchase.id)
            .await?
            .ok_or_else(|| DbError::Corrupt {
                entity: "purchase".to_string(),
                id: purchase.id.clone(),
                reason: "sender row missing".to_string(),
            })?;

        Ok(PurchaseRecord {
            purchase,
            items,
            sender,
            sellers,
        })
    }

    /// Gets a purchase with all of its snapshots.
    pub async fn get_record(&self, id: &str) -> DbResult<Option<PurchaseRecord>> {
        match self.get_by_id(id).await? {
            Some(purchase) => Ok(Some(self.load_record(purchase).await?)),
            None => Ok(None),
        }
    }

    /// One page of the user's purchases, newest first, and the user's
    /// total purchase count.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> DbResult<(Vec<Purchase>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            "{SELECT_PURCHASE} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(user_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(PurchaseRow::into_purchase).collect(), total))
    }

    /// Replaces the payment proof ids of a purchase owned by `owner`.
    ///
    /// Returns `NotFound` when no purchase matches both id and owner.
    pub async fn update_payment_proof(
        &self,
        id: &str,
        owner: &str,
        file_ids: &[String],
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, files = file_ids.len(), "Attaching payment proof");

        let encoded = encode_proof_ids(id, file_ids)?;
        let result = sqlx::query(
            r#"
            UPDATE purchases
            SET payment_proof_ids = ?1, updated_at = ?2
            WHERE id = ?3 AND user_id = ?4
            "#,
        )
        .bind(&encoded)
        .bind(now)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", id));
        }

        Ok(())
    }

    /// Number of stored purchases, across all users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
