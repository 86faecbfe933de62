//! # Repository Module
//!
//! Database repository implementations for OrderDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.orders().confirm(&id)                                       │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── begin transaction                                                  │
//! │  ├── load row, apply orderdesk-core rule                                │
//! │  ├── write                                                              │
//! │  └── commit (or roll back on any error)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rules live in orderdesk-core; repositories only decide *when* to ask them,
//! always inside the transaction that performs the write.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD
//! - [`RecipientRepository`] - Recipient CRUD
//! - [`OrderRepository`] - Order engine
//! - [`ReceiptRepository`] - Receipt rows and the receipt counter
//! - [`ReportRepository`] - Revenue aggregates
//! - [`UserRepository`] - API users

pub mod order;
pub mod product;
pub mod receipt;
pub mod recipient;
pub mod report;
pub mod user;

pub use order::OrderRepository;
pub use product::ProductRepository;
pub use receipt::ReceiptRepository;
pub use recipient::RecipientRepository;
pub use report::ReportRepository;
pub use user::UserRepository;
