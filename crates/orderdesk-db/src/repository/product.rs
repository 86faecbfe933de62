//! # Product Repository
//!
//! Catalog CRUD.
//!
//! ## Deleting A Product
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete(id)                                                             │
//! │     │                                                                   │
//! │     ├── referenced by a CONFIRMED order? ──► ProductInUse (rollback)    │
//! │     │                                                                   │
//! │     ├── remove its lines from draft / cancelled orders                  │
//! │     ├── recompute those orders' subtotal and total                      │
//! │     └── delete the product row                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderdesk_core::input::{NewProduct, ProductPatch};
use orderdesk_core::{CoreError, Product};

const PRODUCT_COLUMNS: &str =
    "id, name, purchase_price_cents, sale_price_cents, currency, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a validated product.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        input.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            purchase_price_cents: input.purchase_price_cents,
            sale_price_cents: input.sale_price_cents,
            currency: input.currency,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, purchase_price_cents, sale_price_cents, currency,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.currency)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a partial update. Existing order lines keep their snapshots.
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        patch.validate().map_err(CoreError::from)?;

        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if let Some(name) = &patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(cents) = patch.purchase_price_cents {
            product.purchase_price_cents = cents;
        }
        if let Some(cents) = patch.sale_price_cents {
            product.sale_price_cents = cents;
        }
        if let Some(currency) = patch.currency {
            product.currency = currency;
        }
        product.updated_at = Utc::now();

        debug!(id = %id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                purchase_price_cents = ?3,
                sale_price_cents = ?4,
                currency = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.currency)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Deletes a product that no confirmed order references.
    ///
    /// Lines of draft and cancelled orders that reference it are removed and
    /// those orders' totals recomputed, all in one transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        let confirmed_refs: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE oi.product_id = ?1 AND o.status = 'confirmed'
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if confirmed_refs > 0 {
            return Err(CoreError::ProductInUse(id.to_string()).into());
        }

        let affected: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT order_id FROM order_items WHERE product_id = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM order_items WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for order_id in &affected {
            sqlx::query(
                r#"
                UPDATE orders SET
                    subtotal_cents = COALESCE(
                        (SELECT SUM(line_total_cents) FROM order_items WHERE order_id = ?1), 0),
                    total_cents = COALESCE(
                        (SELECT SUM(line_total_cents) FROM order_items WHERE order_id = ?1), 0),
                    updated_at = ?2
                WHERE id = ?1
                "#,
            )
            .bind(order_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, orders_recomputed = affected.len(), "Product deleted");
        Ok(())
    }
}

/// Loads every product whose id is in `ids`, on the caller's connection.
///
/// Missing ids are simply absent from the result; pricing reports them.
pub(crate) async fn fetch_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    let products = qb
        .build_query_as::<Product>()
        .fetch_all(&mut *conn)
        .await
        .map_err(DbError::from)?;

    Ok(products)
}
