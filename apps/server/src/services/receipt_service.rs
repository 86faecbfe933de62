//! # Receipt Engine
//!
//! Turns a confirmed order into one numbered, stored and hashed PDF.
//!
//! ## Generation Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  1. load order + recipient + items, check confirmed / no live receipt    │
//! │  2. number = counter(year)          (fallback: clock digits, warned)     │
//! │  3. render PDF, write {storage}/{prefix}-{number}-{millis}.pdf, sha256   │
//! │  4. db: re-check, prune oldest live rows, insert        (one transaction)│
//! │        └─ failure: remove the file written in 3                          │
//! │  5. remove the pruned receipts' files                   (best-effort)    │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The file write sits outside the transaction since the file system can't
//! roll back.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use orderdesk_core::lifecycle::ensure_receipt_allowed;
use orderdesk_core::receipt::{fallback_receipt_number, format_receipt_number, receipt_file_name};
use orderdesk_core::{CoreError, Order, OrderItem, Receipt, ReceiptDetails, ReceiptSummary, ReceiptVariant, Recipient};
use orderdesk_db::{Database, NewReceipt};

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::pdf::layout::{self, ReceiptView};
use crate::printing::{PrintOutcome, Printer};
use crate::services::settings_service::SettingsStore;

/// A stored PDF ready to send.
#[derive(Debug, Clone)]
pub struct ReceiptPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// A rendered file on disk.
struct Artifact {
    path: PathBuf,
    hash: String,
}

/// Receipt generation, storage, retrieval and printing.
pub struct ReceiptService {
    db: Database,
    settings: SettingsStore,
    printer: Arc<dyn Printer>,
    storage_dir: PathBuf,
    /// `{receipt_base_url}{route_prefix}`
    url_base: String,
    retention_limit: usize,
}

impl ReceiptService {
    pub fn new(
        db: Database,
        settings: SettingsStore,
        printer: Arc<dyn Printer>,
        config: &AppConfig,
    ) -> Self {
        ReceiptService {
            db,
            settings,
            printer,
            storage_dir: config.receipt_storage_path.clone(),
            url_base: format!(
                "{}{}",
                config.receipt_base_url.trim_end_matches('/'),
                config.route_prefix()
            ),
            retention_limit: config.receipt_retention_limit,
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn pdf_url(&self, receipt_id: &str) -> String {
        format!("{}/receipts/{receipt_id}/pdf", self.url_base)
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generates the receipt of a confirmed order.
    #[instrument(skip(self))]
    pub async fn generate(&self, order_id: &str, variant: ReceiptVariant) -> ApiResult<Receipt> {
        let details = self.db.orders().find_one(order_id).await?;
        ensure_receipt_allowed(&details.order, &details.receipts)?;

        let now = Utc::now();
        let number = self.next_number(now).await;
        let id = Uuid::new_v4().to_string();

        let view = ReceiptView {
            number: &number,
            issued_at: now,
            order: &details.order,
            recipient: &details.recipient,
            items: &details.items,
        };
        let artifact = self.render_to_disk(variant, &view).await?;

        let new = NewReceipt {
            pdf_url: self.pdf_url(&id),
            id,
            order_id: details.order.id.clone(),
            number: number.clone(),
            variant,
            pdf_path: artifact.path.to_string_lossy().into_owned(),
            hash: artifact.hash.clone(),
        };

        let stored = match self.db.receipts().insert_with_retention(&new, self.retention_limit).await {
            Ok(stored) => stored,
            Err(e) => {
                remove_file_logged(&artifact.path).await;
                return Err(e.into());
            }
        };

        for pruned in &stored.pruned {
            if let Some(path) = &pruned.pdf_path {
                remove_file_logged(Path::new(path)).await;
            }
        }

        info!(
            id = %stored.receipt.id,
            number = %number,
            order_id = %order_id,
            ?variant,
            "Receipt generated"
        );
        Ok(stored.receipt)
    }

    /// Counter value for the current year, or the clock when the counter fails.
    async fn next_number(&self, now: DateTime<Utc>) -> String {
        let year = now.year();
        match self.db.receipts().next_sequence(year).await {
            Ok(seq) => format_receipt_number(year, seq),
            Err(e) => {
                let number = fallback_receipt_number(year, now.timestamp_millis());
                warn!(error = %e, number = %number, "Receipt counter unavailable, using clock-derived number");
                number
            }
        }
    }

    /// Renders with the current branding and writes a new file.
    async fn render_to_disk(&self, variant: ReceiptVariant, view: &ReceiptView<'_>) -> ApiResult<Artifact> {
        let branding = self.settings.branding().await;
        let bytes = layout::render(variant, view, &branding)?;
        let hash = sha256_hex(&bytes);

        let file_name = receipt_file_name(variant, view.number, Utc::now().timestamp_millis());
        let path = self.storage_dir.join(file_name);

        tokio::fs::create_dir_all(&self.storage_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Receipt PDF written");
        Ok(Artifact { path, hash })
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    pub async fn list(&self) -> ApiResult<Vec<ReceiptSummary>> {
        Ok(self.db.receipts().list().await?)
    }

    pub async fn details(&self, id: &str) -> ApiResult<ReceiptDetails> {
        Ok(self.db.receipts().find_details(id).await?)
    }

    async fn receipt(&self, id: &str) -> ApiResult<Receipt> {
        self.db
            .receipts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(id.to_string()).into())
    }

    /// The stored PDF. A missing file is regenerated once.
    #[instrument(skip(self))]
    pub async fn pdf(&self, id: &str) -> ApiResult<ReceiptPdf> {
        let mut receipt = self.receipt(id).await?;

        let bytes = match read_artifact(&receipt).await? {
            Some(bytes) => bytes,
            None => {
                warn!(id = %id, number = %receipt.number, "Receipt PDF missing, regenerating");
                receipt = self.regenerate(id).await?;
                read_artifact(&receipt)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("Receipt PDF not found: {id}")))?
            }
        };

        if !bytes.starts_with(b"%PDF") {
            warn!(id = %id, path = ?receipt.pdf_path, "Stored receipt file is not a PDF");
            return Err(ApiError::internal("Stored receipt file is not a valid PDF"));
        }

        if let Some(expected) = &receipt.hash {
            let actual = sha256_hex(&bytes);
            if &actual != expected {
                warn!(id = %id, expected = %expected, actual = %actual, "Receipt PDF hash mismatch");
            }
        }

        Ok(ReceiptPdf {
            filename: receipt.download_filename(),
            bytes,
        })
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Re-renders from the order's current data, keeping id, number and variant.
    #[instrument(skip(self))]
    pub async fn regenerate(&self, id: &str) -> ApiResult<Receipt> {
        let details = self.db.receipts().find_details(id).await?;
        let ReceiptDetails {
            receipt,
            order,
            recipient,
            items,
        } = details;

        if let Some(old) = &receipt.pdf_path {
            remove_file_logged(Path::new(old)).await;
        }

        let artifact = self
            .render_receipt(&receipt, &order, &recipient, &items)
            .await?;

        let updated = match self
            .db
            .receipts()
            .update_artifact(
                id,
                &artifact.path.to_string_lossy(),
                &self.pdf_url(id),
                &artifact.hash,
            )
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                remove_file_logged(&artifact.path).await;
                return Err(e.into());
            }
        };

        info!(id = %id, number = %updated.number, "Receipt regenerated");
        Ok(updated)
    }

    async fn render_receipt(
        &self,
        receipt: &Receipt,
        order: &Order,
        recipient: &Recipient,
        items: &[OrderItem],
    ) -> ApiResult<Artifact> {
        let view = ReceiptView {
            number: &receipt.number,
            issued_at: receipt.created_at,
            order,
            recipient,
            items,
        };
        self.render_to_disk(receipt.variant, &view).await
    }

    /// Marks a receipt void so the order can get a new one.
    pub async fn void(&self, id: &str) -> ApiResult<Receipt> {
        Ok(self.db.receipts().void(id).await?)
    }

    /// Removes every stored file of an order's receipts. Never fails.
    pub async fn delete_files_for_order(&self, order_id: &str) {
        let receipts = match self.db.receipts().list_for_order(order_id).await {
            Ok(receipts) => receipts,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Could not list receipts for file cleanup");
                return;
            }
        };

        for receipt in receipts {
            if let Some(path) = &receipt.pdf_path {
                remove_file_logged(Path::new(path)).await;
            }
        }
    }

    // =========================================================================
    // Printing
    // =========================================================================

    /// Printer names; empty when the print system can't be queried.
    pub async fn printers(&self) -> Vec<String> {
        self.printer.list_printers().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not list printers");
            Vec::new()
        })
    }

    /// Sends the stored PDF to a printer.
    #[instrument(skip(self))]
    pub async fn print(&self, id: &str, printer: Option<&str>) -> ApiResult<PrintOutcome> {
        let receipt = self.receipt(id).await?;

        let path = receipt.pdf_path.as_deref().map(PathBuf::from);
        let exists = match &path {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        };
        let Some(path) = path.filter(|_| exists) else {
            return Ok(PrintOutcome {
                success: false,
                message: format!("PDF file for receipt {} not found", receipt.number),
            });
        };

        let printer = printer.map(str::trim).filter(|p| !p.is_empty());
        let outcome = PrintOutcome::from_result(self.printer.print_file(&path, printer).await);
        if !outcome.success {
            warn!(id = %id, message = %outcome.message, "Print failed");
        }
        Ok(outcome)
    }
}

/// File contents, or `None` when the receipt has no file on disk.
async fn read_artifact(receipt: &Receipt) -> ApiResult<Option<Vec<u8>>> {
    let Some(path) = &receipt.pdf_path else {
        return Ok(None);
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_file_logged(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Receipt file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove receipt file"),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
