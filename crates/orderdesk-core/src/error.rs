//! # Error Types
//!
//! Domain-specific error types for orderdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orderdesk-core (this file)                                             │
//! │  ├── CoreError        - business rule violations                        │
//! │  └── ValidationError  - input validation failures                       │
//! │                                                                         │
//! │  orderdesk-db                                                           │
//! │  └── DbError          - storage failures, carries CoreError as Domain   │
//! │                                                                         │
//! │  apps/server                                                            │
//! │  └── ApiError         - what HTTP clients see                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each variant knows its [`ErrorKind`], which is what the HTTP layer turns
//! into a status code and machine-readable error code.

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a domain failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Validation,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// At least one requested product id did not resolve.
    #[error("One or more products not found")]
    ProductsNotFound,

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// The order's status does not allow the requested action.
    ///
    /// ## When This Occurs
    /// - Updating or confirming an order that is no longer a draft
    /// - Generating a receipt for an order that is not confirmed
    #[error("Cannot {action} order {order_id} in status {current_status}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: OrderStatus,
        action: &'static str,
    },

    #[error("Order already cancelled")]
    OrderAlreadyCancelled,

    /// Items priced in different currencies were put into one order.
    #[error("All items of an order must share one currency")]
    MixedCurrency,

    #[error("Cannot delete product {0}: it is part of a confirmed order")]
    ProductInUse(String),

    #[error("Cannot delete recipient {0}: it has orders")]
    RecipientHasOrders(String),

    /// A non-void receipt already exists for the order.
    #[error("Receipt already exists for order {0}")]
    ReceiptExists(String),

    #[error("Receipt {0} is already void")]
    ReceiptAlreadyVoid(String),

    /// An amount left the representable range.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// How the HTTP layer should classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::ProductsNotFound
            | CoreError::RecipientNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::ReceiptNotFound(_) => ErrorKind::NotFound,
            CoreError::ReceiptExists(_) => ErrorKind::Conflict,
            CoreError::AmountOverflow(_) | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InvalidOrderStatus { .. }
            | CoreError::OrderAlreadyCancelled
            | CoreError::MixedCurrency
            | CoreError::ProductInUse(_)
            | CoreError::RecipientHasOrders(_)
            | CoreError::ReceiptAlreadyVoid(_) => ErrorKind::BadRequest,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    #[error("{field} must contain at most {max} entries")]
    TooMany { field: String, max: usize },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            current_status: OrderStatus::Confirmed,
            action: "update",
        };
        assert_eq!(err.to_string(), "Cannot update order o-1 in status confirmed");
        assert_eq!(CoreError::ProductsNotFound.to_string(), "One or more products not found");
        assert_eq!(CoreError::OrderAlreadyCancelled.to_string(), "Order already cancelled");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::ProductsNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::ReceiptExists("o".into()).kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::OrderAlreadyCancelled.kind(), ErrorKind::BadRequest);
        assert_eq!(CoreError::AmountOverflow("subtotal").kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
