//! # Report Repository
//!
//! Margin revenue over confirmed orders:
//!
//! ```text
//! revenue = Σ (order_items.unit_price_cents − products.purchase_price_cents) × qty
//! ```
//!
//! Draft and cancelled orders never count. The optional range filters on the
//! order's creation time, both bounds inclusive.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use orderdesk_core::{ProductRevenue, RecipientRevenue, TotalRevenue};

/// Optional creation-time window of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ReportRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

const CONFIRMED_IN_RANGE: &str = r#"
    o.status = 'confirmed'
    AND (?1 IS NULL OR o.created_at >= ?1)
    AND (?2 IS NULL OR o.created_at <= ?2)
"#;

/// Repository for revenue reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue per product, highest first.
    pub async fn revenue_by_product(&self, range: ReportRange) -> DbResult<Vec<ProductRevenue>> {
        let sql = format!(
            r#"
            SELECT
                oi.product_id AS product_id,
                p.name AS product_name,
                p.currency AS currency,
                CAST(SUM((oi.unit_price_cents - p.purchase_price_cents) * oi.qty) AS INTEGER)
                    AS revenue_cents,
                CAST(SUM(oi.qty) AS INTEGER) AS quantity_sold
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY oi.product_id, p.name, p.currency
            ORDER BY revenue_cents DESC, product_name ASC
            "#
        );

        let rows = sqlx::query_as::<_, ProductRevenue>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Revenue per recipient, highest first.
    pub async fn revenue_by_recipient(
        &self,
        range: ReportRange,
    ) -> DbResult<Vec<RecipientRevenue>> {
        let sql = format!(
            r#"
            SELECT
                o.recipient_id AS recipient_id,
                rc.name AS recipient_name,
                o.currency AS currency,
                CAST(SUM((oi.unit_price_cents - p.purchase_price_cents) * oi.qty) AS INTEGER)
                    AS revenue_cents,
                COUNT(DISTINCT o.id) AS order_count
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            JOIN recipients rc ON rc.id = o.recipient_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY o.recipient_id, rc.name, o.currency
            ORDER BY revenue_cents DESC, recipient_name ASC
            "#
        );

        let rows = sqlx::query_as::<_, RecipientRevenue>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Total revenue. No confirmed orders yields [`TotalRevenue::zero`].
    ///
    /// Every order shares the single supported currency, so the first
    /// currency group is the whole answer.
    pub async fn total_revenue(&self, range: ReportRange) -> DbResult<TotalRevenue> {
        let sql = format!(
            r#"
            SELECT
                o.currency AS currency,
                CAST(SUM((oi.unit_price_cents - p.purchase_price_cents) * oi.qty) AS INTEGER)
                    AS revenue_cents,
                COUNT(DISTINCT o.id) AS order_count
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY o.currency
            ORDER BY o.currency
            "#
        );

        let total = sqlx::query_as::<_, TotalRevenue>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(total.unwrap_or_else(TotalRevenue::zero))
    }
}
