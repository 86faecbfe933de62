//! # Validation Module
//!
//! Input validation for catalog, recipient, order and user input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP extractors (axum Json / Query)                           │
//! │  └── shape and types                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── lengths, ranges, formats                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  └── NOT NULL, CHECK, UNIQUE and foreign key constraints                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product or recipient name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted free-text field (address, phone).
pub const MAX_TEXT_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product or recipient).
///
/// ```rust
/// use orderdesk_core::validation::validate_name;
///
/// assert!(validate_name("name", "Coffee beans 1kg").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional free-text field.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates an email address: one `@`, non-empty local part, dotted domain.
///
/// ```rust
/// use orderdesk_core::validation::validate_email;
///
/// assert!(validate_email("buyer@example.com").is_ok());
/// assert!(validate_email("buyer@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let email = email.trim();
    if email.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid("not an email address"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Validates a password for registration: 6 to 128 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len < 6 || len > 128 {
        return Err(ValidationError::OutOfRange {
            field: "password length".to_string(),
            min: 6,
            max: 128,
        });
    }
    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a UUID".to_string(),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices are minor units and may be zero, never negative.
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Item quantity: 1 to [`MAX_ITEM_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// An order has 1 to [`MAX_ORDER_ITEMS`] lines.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    if count > MAX_ORDER_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_ORDER_ITEMS,
        });
    }
    Ok(())
}

/// Pagination window: offset ≥ 0, limit 1..=100.
pub fn validate_page(offset: i64, limit: i64) -> ValidationResult<()> {
    if offset < 0 {
        return Err(ValidationError::Negative {
            field: "offset".to_string(),
        });
    }
    if !(1..=crate::MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: crate::MAX_PAGE_LIMIT,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(validate_name("name", "A").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
        // Cyrillic counts characters, not bytes
        assert!(validate_name("name", &"ж".repeat(200)).is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("no-at.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@@example.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("a@example.").is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_prices() {
        assert!(validate_price_cents("sale_price_cents", 0).is_ok());
        assert_eq!(
            validate_price_cents("sale_price_cents", -1),
            Err(ValidationError::Negative {
                field: "sale_price_cents".to_string()
            })
        );
    }

    #[test]
    fn test_item_count() {
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(MAX_ORDER_ITEMS + 1).is_err());
    }

    #[test]
    fn test_page() {
        assert!(validate_page(0, 10).is_ok());
        assert!(validate_page(-1, 10).is_err());
        assert!(validate_page(0, 0).is_err());
        assert!(validate_page(0, 101).is_err());
    }

    #[test]
    fn test_uuid_and_password() {
        assert!(validate_uuid("id", "123e4567-e89b-12d3-a456-426614174000").is_ok());
        assert!(validate_uuid("id", "nope").is_err());
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
    }
}
