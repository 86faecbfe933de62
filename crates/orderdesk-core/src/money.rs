//! # Money Module
//!
//! Provides the `Money` type and the closed `Currency` set.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount is stored in minor units (kopiykas for UAH).              │
//! │                                                                         │
//! │    product.sale_price_cents ──► item.unit_price_cents                   │
//! │                                      │ × qty                            │
//! │                                      ▼                                  │
//! │                               item.line_total_cents                     │
//! │                                      │ Σ                                │
//! │                                      ▼                                  │
//! │                    order.subtotal_cents == order.total_cents            │
//! │                                                                         │
//! │  No floating point value ever takes part in amount computation.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orderdesk_core::money::{Currency, Money};
//!
//! let price = Money::from_cents(9900);
//! let line = price.checked_mul_qty(2).unwrap();
//! assert_eq!(line.cents(), 19800);
//! assert_eq!(line.format_with(Currency::Uah), "198,00 UAH");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

// =============================================================================
// Currency
// =============================================================================

/// Currencies the catalog may be priced in.
///
/// The set is closed on purpose: orders, receipts and reports all assume a
/// single member today, and adding one is a schema-level decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// Ukrainian hryvnia.
    #[default]
    Uah,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Uah => "UAH",
        }
    }

    /// Display symbol for UIs that can render it.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Uah => "₴",
        }
    }

    /// All supported currencies, for validation messages.
    pub const fn all() -> &'static [Currency] {
        &[Currency::Uah]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UAH" => Ok(Currency::Uah),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units.
///
/// ## Design Decisions
/// - **i64 (signed)**: report margins may go negative when an item was sold
///   below its purchase price
/// - **checked arithmetic** for anything driven by user input (quantities,
///   sums over many lines), so an absurd order fails instead of wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(5500).cents(), 5500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole major units (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Minor part, always 0-99.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use orderdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul_qty(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_qty(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_qty(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Formats as `1 234,56 UAH`: space-grouped thousands, comma decimals.
    ///
    /// This is the form printed on receipts.
    pub fn format_with(&self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.major().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        format!("{sign}{grouped},{:02} {}", self.minor_part(), currency.code())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `1234.56`, used in logs and JSON-adjacent text.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let money = Money::from_cents(25300);
        assert_eq!(money.major(), 253);
        assert_eq!(money.minor_part(), 0);

        let negative = Money::from_cents(-550);
        assert_eq!(negative.major(), -5);
        assert_eq!(negative.minor_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_format_with_grouping() {
        assert_eq!(Money::from_cents(0).format_with(Currency::Uah), "0,00 UAH");
        assert_eq!(Money::from_cents(9900).format_with(Currency::Uah), "99,00 UAH");
        assert_eq!(Money::from_cents(123456).format_with(Currency::Uah), "1 234,56 UAH");
        assert_eq!(
            Money::from_cents(123456789).format_with(Currency::Uah),
            "1 234 567,89 UAH"
        );
        assert_eq!(Money::from_cents(-100050).format_with(Currency::Uah), "-1 000,50 UAH");
    }

    #[test]
    fn test_checked_ops() {
        let price = Money::from_cents(9900);
        assert_eq!(price.checked_mul_qty(2).map(|m| m.cents()), Some(19800));
        assert!(Money::from_cents(i64::MAX / 2 + 1).checked_mul_qty(2).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
    }

    #[test]
    fn test_sum() {
        let total: Money = [19800, 5500].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 25300);
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::Uah.code(), "UAH");
        assert_eq!("uah".parse::<Currency>(), Ok(Currency::Uah));
        assert!("USD".parse::<Currency>().is_err());
        assert_eq!(serde_json::to_string(&Currency::Uah).unwrap(), "\"UAH\"");
    }
}
