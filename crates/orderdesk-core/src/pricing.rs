//! # Order Pricing
//!
//! Turns a requested item set into priced line items and order totals.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [{productId, qty}, ...]  +  resolved catalog products                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  1. validate item count and quantities                                  │
//! │  2. every distinct productId must resolve   ── else ProductsNotFound    │
//! │  3. currency = first item's product currency, all items must share it   │
//! │  4. line_total = sale_price × qty            (checked)                  │
//! │  5. subtotal = total = Σ line_total           (checked)                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  PricedOrder { currency, subtotal, total, items }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are taken from the products as they are *now*; the result is the
//! snapshot stored on the order items.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Currency, Money};
use crate::types::Product;
use crate::validation::{validate_item_count, validate_quantity};

/// One requested line: which product and how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(alias = "product_id")]
    pub product_id: String,
    pub qty: i64,
}

/// A priced line, ready to be persisted as an order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub qty: i64,
    pub line_total_cents: i64,
}

/// Result of pricing a whole item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub currency: Currency,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub items: Vec<PricedItem>,
}

/// Distinct product ids referenced by a request, in first-seen order.
pub fn distinct_product_ids(items: &[ItemRequest]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.product_id.as_str()))
        .map(|item| item.product_id.clone())
        .collect()
}

/// Prices `items` against the resolved `products`.
///
/// `products` may contain more products than requested and in any order;
/// only the ones referenced by `items` are used.
pub fn price_items(items: &[ItemRequest], products: &[Product]) -> CoreResult<PricedOrder> {
    validate_item_count(items.len())?;
    for item in items {
        validate_quantity(item.qty)?;
    }

    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    let requested = distinct_product_ids(items);
    let resolved = requested
        .iter()
        .filter(|id| by_id.contains_key(id.as_str()))
        .count();
    if resolved < requested.len() {
        return Err(CoreError::ProductsNotFound);
    }

    let mut currency: Option<Currency> = None;
    let mut subtotal = Money::zero();
    let mut priced = Vec::with_capacity(items.len());

    for item in items {
        let product = by_id
            .get(item.product_id.as_str())
            .ok_or(CoreError::ProductsNotFound)?;

        match currency {
            None => currency = Some(product.currency),
            Some(c) if c != product.currency => return Err(CoreError::MixedCurrency),
            Some(_) => {}
        }

        let line_total = product
            .sale_price()
            .checked_mul_qty(item.qty)
            .ok_or(CoreError::AmountOverflow("line total"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow("subtotal"))?;

        priced.push(PricedItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit_price_cents: product.sale_price_cents,
            qty: item.qty,
            line_total_cents: line_total.cents(),
        });
    }

    Ok(PricedOrder {
        currency: currency.unwrap_or_default(),
        subtotal_cents: subtotal.cents(),
        // No tax or discount layer: total mirrors subtotal.
        total_cents: subtotal.cents(),
        items: priced,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, purchase: i64, sale: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            purchase_price_cents: purchase,
            sale_price_cents: sale,
            currency: Currency::Uah,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn req(id: &str, qty: i64) -> ItemRequest {
        ItemRequest {
            product_id: id.to_string(),
            qty,
        }
    }

    #[test]
    fn test_prices_example_order() {
        let products = vec![product("a", 5000, 9900), product("b", 3000, 5500)];
        let priced = price_items(&[req("a", 2), req("b", 1)], &products).unwrap();

        assert_eq!(priced.subtotal_cents, 25300);
        assert_eq!(priced.total_cents, 25300);
        assert_eq!(priced.currency, Currency::Uah);
        assert_eq!(priced.items[0].line_total_cents, 19800);
        assert_eq!(priced.items[0].unit_price_cents, 9900);
        assert_eq!(priced.items[1].line_total_cents, 5500);
    }

    #[test]
    fn test_totals_equal_sum_of_lines() {
        let products = vec![product("a", 0, 333), product("b", 0, 1)];
        let priced = price_items(&[req("a", 7), req("b", 999), req("a", 1)], &products).unwrap();
        let sum: i64 = priced.items.iter().map(|i| i.line_total_cents).sum();
        assert_eq!(priced.subtotal_cents, sum);
        for item in &priced.items {
            assert_eq!(item.line_total_cents, item.unit_price_cents * item.qty);
        }
    }

    #[test]
    fn test_duplicate_product_ids_count_once() {
        let products = vec![product("a", 0, 100)];
        let priced = price_items(&[req("a", 1), req("a", 2)], &products).unwrap();
        assert_eq!(priced.items.len(), 2);
        assert_eq!(priced.subtotal_cents, 300);
        assert_eq!(distinct_product_ids(&[req("a", 1), req("a", 2)]), vec!["a"]);
    }

    #[test]
    fn test_missing_product() {
        let products = vec![product("a", 0, 100)];
        let err = price_items(&[req("a", 1), req("ghost", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductsNotFound));
    }

    #[test]
    fn test_rejects_bad_quantities_and_empty_sets() {
        let products = vec![product("a", 0, 100)];
        assert!(price_items(&[req("a", 0)], &products).is_err());
        assert!(price_items(&[req("a", -3)], &products).is_err());
        assert!(price_items(&[], &products).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let products = vec![product("a", 0, i64::MAX / 2)];
        let err = price_items(&[req("a", 3)], &products).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow(_)));
    }
}
