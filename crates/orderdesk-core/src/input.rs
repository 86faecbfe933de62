//! # Write Models
//!
//! What clients send to create or change catalog entries, recipients and
//! orders. Each model validates itself before it reaches the database.
//!
//! Catalog and recipient fields are snake_case; order fields are camelCase
//! (`recipientId`, `productId`) with snake_case aliases accepted.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Currency;
use crate::pricing::ItemRequest;
use crate::validation::{
    validate_email, validate_item_count, validate_name, validate_optional_text,
    validate_price_cents, validate_quantity, ValidationResult,
};

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,
    #[serde(default)]
    pub currency: Currency,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_price_cents("purchase_price_cents", self.purchase_price_cents)?;
        validate_price_cents("sale_price_cents", self.sale_price_cents)
    }
}

/// Partial product update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub currency: Option<Currency>,
}

impl ProductPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(cents) = self.purchase_price_cents {
            validate_price_cents("purchase_price_cents", cents)?;
        }
        if let Some(cents) = self.sale_price_cents {
            validate_price_cents("sale_price_cents", cents)?;
        }
        Ok(())
    }
}

// =============================================================================
// Recipients
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewRecipient {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_contacts(
            self.email.as_deref(),
            self.phone.as_deref(),
            self.address.as_deref(),
        )
    }
}

/// Partial recipient update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl RecipientPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        validate_contacts(
            self.email.as_deref(),
            self.phone.as_deref(),
            self.address.as_deref(),
        )
    }
}

fn validate_contacts(
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
) -> ValidationResult<()> {
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }
    validate_optional_text("phone", phone)?;
    validate_optional_text("address", address)
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(alias = "recipient_id")]
    pub recipient_id: String,
    pub items: Vec<ItemRequest>,
}

impl NewOrder {
    pub fn validate(&self) -> ValidationResult<()> {
        require_id("recipientId", &self.recipient_id)?;
        validate_items(&self.items)
    }
}

/// Draft order edit. `items`, when present, replaces the whole item set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(alias = "recipient_id")]
    pub recipient_id: Option<String>,
    pub items: Option<Vec<ItemRequest>>,
}

impl OrderPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(id) = &self.recipient_id {
            require_id("recipientId", id)?;
        }
        if let Some(items) = &self.items {
            validate_items(items)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.recipient_id.is_none() && self.items.is_none()
    }
}

fn validate_items(items: &[ItemRequest]) -> ValidationResult<()> {
    validate_item_count(items.len())?;
    for item in items {
        require_id("productId", &item.product_id)?;
        validate_quantity(item.qty)?;
    }
    Ok(())
}

fn require_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_accepts_camel_and_snake_case() {
        let camel: NewOrder =
            serde_json::from_str(r#"{"recipientId":"r","items":[{"productId":"p","qty":2}]}"#)
                .unwrap();
        let snake: NewOrder =
            serde_json::from_str(r#"{"recipient_id":"r","items":[{"product_id":"p","qty":2}]}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert!(camel.validate().is_ok());
    }

    #[test]
    fn test_new_order_rules() {
        let empty = NewOrder {
            recipient_id: "r".into(),
            items: vec![],
        };
        assert!(empty.validate().is_err());

        let zero_qty = NewOrder {
            recipient_id: "r".into(),
            items: vec![ItemRequest {
                product_id: "p".into(),
                qty: 0,
            }],
        };
        assert!(zero_qty.validate().is_err());
    }

    #[test]
    fn test_product_defaults_currency() {
        let p: NewProduct = serde_json::from_str(
            r#"{"name":"Tea","purchase_price_cents":100,"sale_price_cents":250}"#,
        )
        .unwrap();
        assert_eq!(p.currency, Currency::Uah);
        assert!(p.validate().is_ok());

        let negative = NewProduct {
            sale_price_cents: -1,
            ..p
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_recipient_email_optional_but_checked() {
        let mut r = NewRecipient {
            name: "Olena".into(),
            email: None,
            phone: Some("+380 44 000 0000".into()),
            address: None,
        };
        assert!(r.validate().is_ok());
        r.email = Some("".into());
        assert!(r.validate().is_ok());
        r.email = Some("broken".into());
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_order_patch_empty() {
        assert!(OrderPatch::default().is_empty());
        assert!(OrderPatch::default().validate().is_ok());
    }
}
