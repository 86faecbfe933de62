//! # Receipt Repository
//!
//! Receipt rows and the per-year receipt counter. Rendering and files belong
//! to the server; this repository stores what the server produced.
//!
//! ## Receipt Counter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receipt_counters                                                       │
//! │  ┌──────┬────────────┐                                                  │
//! │  │ year │ last_value │   INSERT ... ON CONFLICT(year)                   │
//! │  ├──────┼────────────┤   DO UPDATE SET last_value = last_value + 1      │
//! │  │ 2025 │        418 │   RETURNING last_value                           │
//! │  │ 2026 │         17 │                                                  │
//! │  └──────┴────────────┘   One statement: concurrent callers never see    │
//! │                          the same value.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::order::{fetch_items, fetch_order};
use crate::repository::recipient::fetch_recipient;
use orderdesk_core::lifecycle::{ensure_receipt_allowed, ensure_voidable};
use orderdesk_core::receipt::prune_count;
use orderdesk_core::{
    CoreError, Receipt, ReceiptDetails, ReceiptStatus, ReceiptSummary, ReceiptVariant,
};

const RECEIPT_COLUMNS: &str =
    "id, order_id, number, variant, pdf_url, pdf_path, hash, status, created_at, updated_at";

/// What the receipt engine hands over for insertion.
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub id: String,
    pub order_id: String,
    pub number: String,
    pub variant: ReceiptVariant,
    pub pdf_url: String,
    pub pdf_path: String,
    pub hash: String,
}

/// A freshly inserted receipt and the rows pruned to make room for it.
#[derive(Debug, Clone)]
pub struct StoredReceipt {
    pub receipt: Receipt,
    pub pruned: Vec<Receipt>,
}

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Advances the counter of `year` and returns the new value.
    ///
    /// The first call of a year returns 1.
    pub async fn next_sequence(&self, year: i32) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO receipt_counters (year, last_value) VALUES (?1, 1)
            ON CONFLICT (year) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        debug!(year, value, "Receipt counter advanced");
        Ok(value)
    }

    /// Inserts a generated receipt, pruning the oldest live receipts first.
    ///
    /// ## What This Does
    /// 1. Re-checks the order: confirmed, no live receipt
    /// 2. Deletes the oldest live receipt rows beyond `retention_limit - 1`
    ///    (failures are logged and skipped)
    /// 3. Inserts the new row
    ///
    /// All in one `BEGIN IMMEDIATE` transaction, so the write lock is taken
    /// before the re-check reads. The pruned rows are returned so the caller
    /// can remove their files once the transaction has committed.
    ///
    /// ## Errors
    /// `CoreError::ReceiptExists` when the order already has a live receipt.
    /// Concurrent generations for one order are settled by the write lock and
    /// the partial unique index; a caller that still finds the database busy
    /// gets `ReceiptExists` when the competing receipt is already live.
    pub async fn insert_with_retention(
        &self,
        new: &NewReceipt,
        retention_limit: usize,
    ) -> DbResult<StoredReceipt> {
        match self.insert_locked(new, retention_limit).await {
            Err(err) if err.is_busy() => Err(self.settle_busy(&new.order_id, err).await),
            result => result,
        }
    }

    async fn settle_busy(&self, order_id: &str, err: DbError) -> DbError {
        match self.list_for_order(order_id).await {
            Ok(receipts) if receipts.iter().any(|r| r.status == ReceiptStatus::Generated) => {
                warn!(order_id = %order_id, "Database busy, order already has a live receipt");
                CoreError::ReceiptExists(order_id.to_string()).into()
            }
            _ => err,
        }
    }

    async fn insert_locked(
        &self,
        new: &NewReceipt,
        retention_limit: usize,
    ) -> DbResult<StoredReceipt> {
        let now = Utc::now();
        let receipt = Receipt {
            id: new.id.clone(),
            order_id: new.order_id.clone(),
            number: new.number.clone(),
            variant: new.variant,
            pdf_url: Some(new.pdf_url.clone()),
            pdf_path: Some(new.pdf_path.clone()),
            hash: Some(new.hash.clone()),
            status: ReceiptStatus::Generated,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let order = fetch_order(&mut tx, &receipt.order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(receipt.order_id.clone()))?;
        let existing = fetch_for_order(&mut tx, &order.id).await?;
        ensure_receipt_allowed(&order, &existing)?;

        let pruned = match prune_oldest(&mut tx, retention_limit).await {
            Ok(pruned) => pruned,
            Err(e) => {
                warn!(error = %e, "Receipt pruning failed, keeping old receipts");
                Vec::new()
            }
        };

        debug!(
            id = %receipt.id,
            number = %receipt.number,
            order_id = %receipt.order_id,
            pruned = pruned.len(),
            "Inserting receipt"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO receipts (
                id, order_id, number, variant, pdf_url, pdf_path, hash, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.order_id)
        .bind(&receipt.number)
        .bind(receipt.variant)
        .bind(&receipt.pdf_url)
        .bind(&receipt.pdf_path)
        .bind(&receipt.hash)
        .bind(receipt.status)
        .bind(receipt.created_at)
        .bind(receipt.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            let err = DbError::from(e);
            return Err(if err.is_unique_violation_on("receipts.order_id") {
                CoreError::ReceiptExists(receipt.order_id).into()
            } else if err.is_unique_violation_on("receipts.number") {
                DbError::UniqueViolation {
                    field: "receipts.number".to_string(),
                    value: receipt.number,
                }
            } else {
                err
            });
        }

        tx.commit().await?;

        if !pruned.is_empty() {
            info!(pruned = pruned.len(), "Old receipts pruned");
        }

        Ok(StoredReceipt { receipt, pruned })
    }

    /// Gets a receipt by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        fetch_receipt(&mut conn, id).await
    }

    /// A receipt with its order, recipient and items.
    pub async fn find_details(&self, id: &str) -> DbResult<ReceiptDetails> {
        let mut conn = self.pool.acquire().await?;

        let receipt = fetch_receipt(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(id.to_string()))?;
        let order = fetch_order(&mut conn, &receipt.order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(receipt.order_id.clone()))?;
        let recipient = fetch_recipient(&mut conn, &order.recipient_id)
            .await?
            .ok_or_else(|| CoreError::RecipientNotFound(order.recipient_id.clone()))?;
        let items = fetch_items(&mut conn, &order.id).await?;

        Ok(ReceiptDetails {
            receipt,
            order,
            recipient,
            items,
        })
    }

    /// All receipts with order status, total and recipient name, newest first.
    pub async fn list(&self) -> DbResult<Vec<ReceiptSummary>> {
        let summaries = sqlx::query_as::<_, ReceiptSummary>(
            r#"
            SELECT
                r.id, r.order_id, r.number, r.variant, r.pdf_url, r.pdf_path, r.hash,
                r.status, r.created_at, r.updated_at,
                o.status AS order_status,
                o.total_cents AS order_total_cents,
                o.currency AS currency,
                rc.name AS recipient_name
            FROM receipts r
            JOIN orders o ON o.id = r.order_id
            JOIN recipients rc ON rc.id = o.recipient_id
            ORDER BY r.created_at DESC, r.rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    /// Every receipt of an order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Receipt>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_order(&mut conn, order_id).await
    }

    /// Points a receipt at a freshly rendered artifact.
    pub async fn update_artifact(
        &self,
        id: &str,
        pdf_path: &str,
        pdf_url: &str,
        hash: &str,
    ) -> DbResult<Receipt> {
        let now = Utc::now();

        let updated = sqlx::query(
            r#"
            UPDATE receipts SET pdf_path = ?2, pdf_url = ?3, hash = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(pdf_path)
        .bind(pdf_url)
        .bind(hash)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(CoreError::ReceiptNotFound(id.to_string()).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(id.to_string()).into())
    }

    /// `generated → void`. Frees the order for a new receipt.
    pub async fn void(&self, id: &str) -> DbResult<Receipt> {
        let mut tx = self.pool.begin().await?;

        let mut receipt = fetch_receipt(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(id.to_string()))?;
        ensure_voidable(&receipt)?;

        receipt.status = ReceiptStatus::Void;
        receipt.updated_at = Utc::now();

        sqlx::query("UPDATE receipts SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(receipt.status)
            .bind(receipt.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, number = %receipt.number, "Receipt voided");
        Ok(receipt)
    }
}

/// Deletes the oldest live receipts so that `limit - 1` remain.
async fn prune_oldest(conn: &mut SqliteConnection, limit: usize) -> DbResult<Vec<Receipt>> {
    let live: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE status = 'generated'")
            .fetch_one(&mut *conn)
            .await?;

    let surplus = prune_count(usize::try_from(live).unwrap_or(0), limit);
    if surplus == 0 {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE status = 'generated' \
         ORDER BY created_at ASC, rowid ASC LIMIT ?1"
    );
    let oldest = sqlx::query_as::<_, Receipt>(&sql)
        .bind(surplus as i64)
        .fetch_all(&mut *conn)
        .await?;

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("DELETE FROM receipts WHERE id IN (");
    let mut separated = qb.separated(", ");
    for receipt in &oldest {
        separated.push_bind(receipt.id.clone());
    }
    separated.push_unseparated(")");
    qb.build().execute(&mut *conn).await?;

    Ok(oldest)
}

pub(crate) async fn fetch_receipt(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Receipt>> {
    let sql = format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ?1");
    let receipt = sqlx::query_as::<_, Receipt>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(receipt)
}

pub(crate) async fn fetch_for_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<Receipt>> {
    let sql = format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE order_id = ?1 ORDER BY created_at, rowid"
    );
    let receipts = sqlx::query_as::<_, Receipt>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(receipts)
}
