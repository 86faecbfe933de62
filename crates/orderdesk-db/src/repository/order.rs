//! # Order Repository
//!
//! The order engine: every state-changing operation runs in one transaction
//! and asks orderdesk-core whether it is allowed.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── recipient exists? products exist? one currency?                 │
//! │     └── snapshot name + sale price into each item                       │
//! │     └── insert order + items            → Order { status: draft }       │
//! │                                                                         │
//! │  2. UPDATE (draft only)                                                 │
//! │     └── replace recipient and/or the whole item set, recompute totals   │
//! │                                                                         │
//! │  3. CONFIRM (draft only)                → Order { status: confirmed }   │
//! │                                                                         │
//! │  4. CANCEL (draft or confirmed)         → Order { status: cancelled }   │
//! │                                                                         │
//! │  5. DELETE (any status)                                                 │
//! │     └── receipts, items, order removed together                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Order totals are only ever written together with the item set they sum.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::product::fetch_by_ids;
use crate::repository::receipt::fetch_for_order;
use crate::repository::recipient::fetch_recipient;
use orderdesk_core::input::{NewOrder, OrderPatch};
use orderdesk_core::lifecycle::{ensure_cancellable, ensure_confirmable, ensure_editable};
use orderdesk_core::pricing::{distinct_product_ids, price_items, ItemRequest, PricedOrder};
use orderdesk_core::validation::validate_page;
use orderdesk_core::{CoreError, CoreResult, Order, OrderDetails, OrderItem, OrderStatus, Page};

const ORDER_COLUMNS: &str =
    "id, recipient_id, status, subtotal_cents, total_cents, currency, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit_price_cents, qty, line_total_cents";

/// Repository for the order engine.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates a draft order.
    ///
    /// ## What This Does
    /// 1. Validates the request shape
    /// 2. Checks the recipient exists
    /// 3. Resolves every product id in one query
    /// 4. Prices the items (snapshotting name and sale price)
    /// 5. Inserts order and items, then commits
    pub async fn create(&self, input: &NewOrder) -> DbResult<OrderDetails> {
        input.validate().map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        if fetch_recipient(&mut tx, &input.recipient_id).await?.is_none() {
            return Err(CoreError::RecipientNotFound(input.recipient_id.clone()).into());
        }

        let priced = price_request(&mut tx, &input.items).await?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            recipient_id: input.recipient_id.clone(),
            status: OrderStatus::Draft,
            subtotal_cents: priced.subtotal_cents,
            total_cents: priced.total_cents,
            currency: priced.currency,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %order.id,
            items = priced.items.len(),
            total_cents = order.total_cents,
            "Creating order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, recipient_id, status, subtotal_cents, total_cents, currency,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.recipient_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.total_cents)
        .bind(order.currency)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &order.id, &priced).await?;

        let details = load_details(&mut tx, order).await?;
        tx.commit().await?;

        info!(id = %details.order.id, "Order created");
        Ok(details)
    }

    /// Edits a draft order.
    ///
    /// A new item set replaces the old one and the totals are recomputed in
    /// the same transaction.
    pub async fn update(&self, id: &str, patch: &OrderPatch) -> DbResult<OrderDetails> {
        patch.validate().map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
        ensure_editable(&order)?;

        if let Some(recipient_id) = &patch.recipient_id {
            if fetch_recipient(&mut tx, recipient_id).await?.is_none() {
                return Err(CoreError::RecipientNotFound(recipient_id.clone()).into());
            }
            order.recipient_id = recipient_id.clone();
        }

        if let Some(items) = &patch.items {
            let priced = price_request(&mut tx, items).await?;

            sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_items(&mut tx, id, &priced).await?;

            order.subtotal_cents = priced.subtotal_cents;
            order.total_cents = priced.total_cents;
            order.currency = priced.currency;
        }

        order.updated_at = Utc::now();

        debug!(id = %id, total_cents = order.total_cents, "Updating order");

        sqlx::query(
            r#"
            UPDATE orders SET
                recipient_id = ?2,
                subtotal_cents = ?3,
                total_cents = ?4,
                currency = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&order.recipient_id)
        .bind(order.subtotal_cents)
        .bind(order.total_cents)
        .bind(order.currency)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        let details = load_details(&mut tx, order).await?;
        tx.commit().await?;

        Ok(details)
    }

    /// `draft → confirmed`.
    pub async fn confirm(&self, id: &str) -> DbResult<Order> {
        self.transition(id, OrderStatus::Confirmed, ensure_confirmable)
            .await
    }

    /// `draft | confirmed → cancelled`. Cancelling twice fails.
    pub async fn cancel(&self, id: &str) -> DbResult<Order> {
        self.transition(id, OrderStatus::Cancelled, ensure_cancellable)
            .await
    }

    async fn transition(
        &self,
        id: &str,
        to: OrderStatus,
        guard: fn(&Order) -> CoreResult<()>,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;
        guard(&order)?;

        let from = order.status;
        order.status = to;
        order.updated_at = Utc::now();

        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(order.status)
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, from = %from, to = %to, "Order status changed");
        Ok(order)
    }

    /// Deletes an order with its items and receipt rows.
    ///
    /// Receipt files are the caller's business and must be removed first.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if fetch_order(&mut tx, id).await?.is_none() {
            return Err(CoreError::OrderNotFound(id.to_string()).into());
        }

        let receipts = sqlx::query("DELETE FROM receipts WHERE order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, receipts, "Order deleted");
        Ok(())
    }

    /// Gets an order row by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// An order with recipient, items and receipts.
    pub async fn find_one(&self, id: &str) -> DbResult<OrderDetails> {
        let mut conn = self.pool.acquire().await?;

        let order = fetch_order(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))?;

        load_details(&mut conn, order).await
    }

    /// One page of orders, newest first, optionally filtered by status.
    pub async fn find_all(
        &self,
        offset: i64,
        limit: i64,
        status: Option<OrderStatus>,
    ) -> DbResult<Page<OrderDetails>> {
        validate_page(offset, limit).map_err(CoreError::from)?;

        let mut conn = self.pool.acquire().await?;

        let (filter, count_sql) = match status {
            Some(_) => (
                "WHERE status = ?1",
                "SELECT COUNT(*) FROM orders WHERE status = ?1",
            ),
            None => ("", "SELECT COUNT(*) FROM orders"),
        };

        let mut count_query = sqlx::query_scalar::<_, i64>(count_sql);
        if let Some(status) = status {
            count_query = count_query.bind(status);
        }
        let total = count_query.fetch_one(&mut *conn).await?;

        let list_sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders {filter} \
             ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut list_query = sqlx::query_as::<_, Order>(&list_sql);
        if let Some(status) = status {
            list_query = list_query.bind(status);
        }
        let orders = list_query.fetch_all(&mut *conn).await?;

        let mut data = Vec::with_capacity(orders.len());
        for order in orders {
            data.push(load_details(&mut conn, order).await?);
        }

        Ok(Page {
            data,
            total,
            offset,
            limit,
        })
    }
}

// =============================================================================
// Connection-level helpers (shared with the receipt repository)
// =============================================================================

pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(order)
}

pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY position, rowid"
    );
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

/// Joins recipient, items and receipts onto `order`.
pub(crate) async fn load_details(
    conn: &mut SqliteConnection,
    order: Order,
) -> DbResult<OrderDetails> {
    let recipient = fetch_recipient(conn, &order.recipient_id)
        .await?
        .ok_or_else(|| CoreError::RecipientNotFound(order.recipient_id.clone()))?;
    let items = fetch_items(conn, &order.id).await?;
    let receipts = fetch_for_order(conn, &order.id).await?;

    Ok(OrderDetails {
        order,
        recipient,
        items,
        receipts,
    })
}

async fn price_request(conn: &mut SqliteConnection, items: &[ItemRequest]) -> DbResult<PricedOrder> {
    let ids = distinct_product_ids(items);
    let products = fetch_by_ids(conn, &ids).await?;
    Ok(price_items(items, &products)?)
}

async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: &str,
    priced: &PricedOrder,
) -> DbResult<()> {
    for (position, item) in priced.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name,
                unit_price_cents, qty, line_total_cents, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.unit_price_cents)
        .bind(item.qty)
        .bind(item.line_total_cents)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
