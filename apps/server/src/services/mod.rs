//! Services behind the HTTP handlers.
//!
//! The repositories in orderdesk-db cover everything that lives in the
//! database. These cover what also touches the file system or the OS.

pub mod receipt_service;
pub mod settings_service;

pub use receipt_service::{ReceiptPdf, ReceiptService};
pub use settings_service::{CompanySettings, LogoInfo, SettingsStore};
