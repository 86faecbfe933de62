//! # Domain Types
//!
//! Core domain types used throughout OrderDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │      Order      │   │     Receipt     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │        │
//! │  │  name           │   │  recipient_id   │   │  order_id (FK)  │        │
//! │  │  purchase_price │   │  status         │   │  number         │        │
//! │  │  sale_price     │   │  total_cents    │   │  pdf_path, hash │        │
//! │  └────────┬────────┘   └────────┬────────┘   └─────────────────┘        │
//! │           │ snapshot            │ owns                                  │
//! │           ▼                     ▼                                       │
//! │  ┌─────────────────────────────────────────┐   ┌─────────────────┐      │
//! │  │ OrderItem: product_name, unit_price,    │   │   Recipient     │      │
//! │  │            qty, line_total              │   │  name, contacts │      │
//! │  └─────────────────────────────────────────┘   └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order items copy the product's name and sale price at write time. Editing
//! a product later never changes an existing order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::{Currency, Money};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// What the business paid, in minor units.
    pub purchase_price_cents: i64,
    /// What the customer pays, in minor units.
    pub sale_price_cents: i64,
    pub currency: Currency,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }
}

// =============================================================================
// Recipient
// =============================================================================

/// A customer orders are made out to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order.
///
/// ```text
///            confirm             (delete allowed from every state)
///   draft ─────────────► confirmed
///     │                      │
///     │ cancel               │ cancel
///     ▼                      ▼
///   cancelled ◄──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    /// Being assembled; recipient and items are editable.
    #[default]
    Draft,
    /// Final; receipts may be generated.
    Confirmed,
    /// Final; never contributes to revenue.
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

// =============================================================================
// Order / Order Item
// =============================================================================

/// An order row. Totals always equal the sum of its items' line totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub recipient_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub currency: Currency,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item. Uses snapshot pattern to freeze product data at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub qty: i64,
    pub line_total_cents: i64,
}

/// An order with everything a detail view or a receipt needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub recipient: Recipient,
    pub items: Vec<OrderItem>,
    pub receipts: Vec<Receipt>,
}

// =============================================================================
// Receipt
// =============================================================================

/// Status of a receipt. At most one `generated` receipt exists per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReceiptStatus {
    #[default]
    Generated,
    Void,
}

/// PDF layout a receipt is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReceiptVariant {
    /// A4 with company header, recipient block and items table.
    #[default]
    Default,
    /// Narrow roll-width slip.
    Compact,
    /// A4 document with signature line.
    Standard,
}

impl ReceiptVariant {
    /// File name prefix of stored artifacts.
    pub const fn file_prefix(&self) -> &'static str {
        match self {
            ReceiptVariant::Default => "receipt",
            ReceiptVariant::Compact => "compact-receipt",
            ReceiptVariant::Standard => "standard-receipt",
        }
    }
}

/// A generated receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Receipt {
    pub id: String,
    pub order_id: String,
    /// Human-readable serial, `YYYY-NNNNNN`.
    pub number: String,
    pub variant: ReceiptVariant,
    pub pdf_url: Option<String>,
    pub pdf_path: Option<String>,
    /// SHA-256 hex digest of the bytes at `pdf_path`.
    pub hash: Option<String>,
    pub status: ReceiptStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    /// File name offered to downloaders.
    pub fn download_filename(&self) -> String {
        format!("receipt-{}.pdf", self.number)
    }
}

/// A receipt listed together with the order it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReceiptSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub receipt: Receipt,
    pub order_status: OrderStatus,
    pub order_total_cents: i64,
    pub currency: Currency,
    pub recipient_name: String,
}

/// A receipt with its full order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptDetails {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub order: Order,
    pub recipient: Recipient,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Users
// =============================================================================

/// Public view of an API user. The password hash never leaves orderdesk-db.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// =============================================================================
// Reporting
// =============================================================================

/// Margin revenue of one product over confirmed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductRevenue {
    pub product_id: String,
    pub product_name: String,
    pub currency: Currency,
    /// Σ (unit_price − purchase_price) × qty
    pub revenue_cents: i64,
    pub quantity_sold: i64,
}

/// Margin revenue attributed to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipientRevenue {
    pub recipient_id: String,
    pub recipient_name: String,
    pub currency: Currency,
    pub revenue_cents: i64,
    pub order_count: i64,
}

/// Revenue across all confirmed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TotalRevenue {
    pub currency: Currency,
    pub revenue_cents: i64,
    pub order_count: i64,
}

impl TotalRevenue {
    /// The answer when nothing matched: zero in the default currency.
    pub fn zero() -> Self {
        TotalRevenue {
            currency: Currency::default(),
            revenue_cents: 0,
            order_count: 0,
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a listing plus the echoed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [OrderStatus::Draft, OrderStatus::Confirmed, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("archived".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Confirmed).unwrap(), "\"confirmed\"");
        assert_eq!(serde_json::to_string(&ReceiptStatus::Void).unwrap(), "\"void\"");
        assert_eq!(serde_json::to_string(&ReceiptVariant::Compact).unwrap(), "\"compact\"");
    }

    #[test]
    fn test_variant_prefixes() {
        assert_eq!(ReceiptVariant::Default.file_prefix(), "receipt");
        assert_eq!(ReceiptVariant::Compact.file_prefix(), "compact-receipt");
        assert_eq!(ReceiptVariant::Standard.file_prefix(), "standard-receipt");
    }

    #[test]
    fn test_total_revenue_zero() {
        let zero = TotalRevenue::zero();
        assert_eq!(zero.revenue_cents, 0);
        assert_eq!(zero.order_count, 0);
        assert_eq!(zero.currency, Currency::Uah);
    }
}
