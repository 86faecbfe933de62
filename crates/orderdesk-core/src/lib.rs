//! # orderdesk-core: Pure Business Logic for OrderDesk
//!
//! Everything in this crate is deterministic and free of I/O: pricing,
//! lifecycle rules, receipt numbering, validation and the domain types that
//! flow through the database and HTTP layers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       OrderDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 Web UI (products, orders, receipts)             │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │    apps/server: routes, receipt engine, PDF, printing           │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ orderdesk-core (THIS CRATE) ★                   │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────────────┐  │    │
//! │  │   │  types   │ │  money   │ │  pricing  │ │ lifecycle/receipt│  │    │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────────────┘  │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │              orderdesk-db: SQLite, transactions                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Receipt, ...)
//! - [`money`] - Money in minor units and the Currency set
//! - [`pricing`] - Line totals and order totals
//! - [`input`] - Validated write models
//! - [`lifecycle`] - Order and receipt state guards
//! - [`receipt`] - Receipt numbers, file names, retention
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use orderdesk_core::pricing::{price_items, ItemRequest};
//! use orderdesk_core::{Currency, Product};
//!
//! let coffee = Product {
//!     id: "p-1".into(),
//!     name: "Coffee".into(),
//!     purchase_price_cents: 5000,
//!     sale_price_cents: 9900,
//!     currency: Currency::Uah,
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let priced = price_items(
//!     &[ItemRequest { product_id: "p-1".into(), qty: 2 }],
//!     &[coffee],
//! )
//! .unwrap();
//! assert_eq!(priced.total_cents, 19800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Currency, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default page size of listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page a client may request.
pub const MAX_PAGE_LIMIT: i64 = 100;
