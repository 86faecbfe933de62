//! # OrderDesk Server
//!
//! REST back office for products, recipients, orders and numbered PDF
//! receipts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          OrderDesk Server                               │
//! │                                                                         │
//! │  error_envelope ─► trace ─► cors ─► body limit ─► router                │
//! │                                                     │                   │
//! │        /health, /auth/register, /auth/login ◄──────┤ public            │
//! │                                                     │                   │
//! │        require_auth (x-api-key?, bearer JWT) ◄─────┘ everything else   │
//! │            │                                                            │
//! │            ├─ products / recipients / orders / reports ─► orderdesk-db │
//! │            ├─ receipts ─► ReceiptService ─► pdf, storage dir, printer  │
//! │            └─ settings ─► SettingsStore  ─► company.json, logo.png     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::AppConfig`]; every key can be set as `ORDERDESK_<KEY>`.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod pdf;
pub mod printing;
pub mod services;

use std::sync::Arc;

use orderdesk_db::Database;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};

use crate::auth::JwtManager;
use crate::config::ConfigError;
use crate::printing::Printer;
use crate::services::{ReceiptService, SettingsStore};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub jwt: JwtManager,
    pub receipts: ReceiptService,
    pub settings: SettingsStore,
}

impl AppState {
    /// Wires the services together from a loaded configuration.
    pub fn new(db: Database, config: AppConfig, printer: Arc<dyn Printer>) -> Result<Self, ConfigError> {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs()?);
        let settings = SettingsStore::new(config.settings_path.clone());
        let receipts = ReceiptService::new(db.clone(), settings.clone(), printer, &config);

        Ok(AppState {
            db,
            config,
            jwt,
            receipts,
            settings,
        })
    }
}
