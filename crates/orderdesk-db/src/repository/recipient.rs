//! # Recipient Repository
//!
//! Recipient CRUD. A recipient with any order, in any status, cannot be
//! deleted.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use orderdesk_core::input::{NewRecipient, RecipientPatch};
use orderdesk_core::{CoreError, Recipient};

const RECIPIENT_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";

/// Repository for recipient database operations.
#[derive(Debug, Clone)]
pub struct RecipientRepository {
    pool: SqlitePool,
}

impl RecipientRepository {
    /// Creates a new RecipientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RecipientRepository { pool }
    }

    /// Lists all recipients, newest first.
    pub async fn list(&self) -> DbResult<Vec<Recipient>> {
        let sql = format!(
            "SELECT {RECIPIENT_COLUMNS} FROM recipients ORDER BY created_at DESC, rowid DESC"
        );
        let recipients = sqlx::query_as::<_, Recipient>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(recipients)
    }

    /// Gets a recipient by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Recipient>> {
        let mut conn = self.pool.acquire().await?;
        fetch_recipient(&mut conn, id).await
    }

    pub async fn create(&self, input: &NewRecipient) -> DbResult<Recipient> {
        input.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let recipient = Recipient {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: normalize(input.email.as_deref()),
            phone: normalize(input.phone.as_deref()),
            address: normalize(input.address.as_deref()),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %recipient.id, name = %recipient.name, "Inserting recipient");

        sqlx::query(
            r#"
            INSERT INTO recipients (id, name, email, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&recipient.id)
        .bind(&recipient.name)
        .bind(&recipient.email)
        .bind(&recipient.phone)
        .bind(&recipient.address)
        .bind(recipient.created_at)
        .bind(recipient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(recipient)
    }

    /// Applies a partial update; an empty string clears an optional field.
    pub async fn update(&self, id: &str, patch: &RecipientPatch) -> DbResult<Recipient> {
        patch.validate().map_err(CoreError::from)?;

        let mut recipient = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::RecipientNotFound(id.to_string()))?;

        if let Some(name) = &patch.name {
            recipient.name = name.trim().to_string();
        }
        if let Some(email) = &patch.email {
            recipient.email = normalize(Some(email));
        }
        if let Some(phone) = &patch.phone {
            recipient.phone = normalize(Some(phone));
        }
        if let Some(address) = &patch.address {
            recipient.address = normalize(Some(address));
        }
        recipient.updated_at = Utc::now();

        debug!(id = %id, "Updating recipient");

        sqlx::query(
            r#"
            UPDATE recipients SET
                name = ?2, email = ?3, phone = ?4, address = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&recipient.name)
        .bind(&recipient.email)
        .bind(&recipient.phone)
        .bind(&recipient.address)
        .bind(recipient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(recipient)
    }

    /// Deletes a recipient without orders.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        if fetch_recipient(&mut tx, id).await?.is_none() {
            return Err(CoreError::RecipientNotFound(id.to_string()).into());
        }

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE recipient_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if orders > 0 {
            return Err(CoreError::RecipientHasOrders(id.to_string()).into());
        }

        sqlx::query("DELETE FROM recipients WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "Recipient deleted");
        Ok(())
    }
}

/// Loads a recipient on the caller's connection or transaction.
pub(crate) async fn fetch_recipient(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Recipient>> {
    let sql = format!("SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE id = ?1");
    let recipient = sqlx::query_as::<_, Recipient>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(recipient)
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
