//! # Receipt Numbering and Retention
//!
//! Receipt numbers look like `2026-000042`: the calendar year and a
//! six-digit, zero-padded value from a per-year counter. When the counter is
//! unavailable a number is derived from the clock instead; that path is
//! best-effort unique only.

use crate::types::ReceiptVariant;

/// Default maximum number of live receipts kept on disk.
pub const DEFAULT_RETENTION_LIMIT: usize = 10;

/// Formats a counter value: `{year}-{seq:06}`.
///
/// ```rust
/// use orderdesk_core::receipt::format_receipt_number;
///
/// assert_eq!(format_receipt_number(2026, 42), "2026-000042");
/// ```
pub fn format_receipt_number(year: i32, sequence: i64) -> String {
    format!("{year}-{sequence:06}")
}

/// Clock-derived number: the year and the last six digits of `timestamp_millis`.
///
/// ```rust
/// use orderdesk_core::receipt::fallback_receipt_number;
///
/// assert_eq!(fallback_receipt_number(2026, 1_760_000_123_456), "2026-123456");
/// ```
pub fn fallback_receipt_number(year: i32, timestamp_millis: i64) -> String {
    format_receipt_number(year, timestamp_millis.rem_euclid(1_000_000))
}

/// Storage file name: `{prefix}-{number}-{millis}.pdf`.
pub fn receipt_file_name(variant: ReceiptVariant, number: &str, timestamp_millis: i64) -> String {
    format!("{}-{}-{}.pdf", variant.file_prefix(), number, timestamp_millis)
}

/// How many of the oldest live receipts to prune before adding one more.
///
/// Pruning starts once `live` reaches `limit` and keeps the newest
/// `limit - 1`, so the new receipt brings the total back to `limit`.
///
/// ```rust
/// use orderdesk_core::receipt::prune_count;
///
/// assert_eq!(prune_count(9, 10), 0);
/// assert_eq!(prune_count(10, 10), 1);
/// assert_eq!(prune_count(14, 10), 5);
/// ```
pub fn prune_count(live: usize, limit: usize) -> usize {
    if limit == 0 || live < limit {
        return 0;
    }
    live - (limit - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_receipt_number(2026, 1), "2026-000001");
        assert_eq!(format_receipt_number(2026, 999_999), "2026-999999");
        assert_eq!(format_receipt_number(2026, 1_000_000), "2026-1000000");
    }

    #[test]
    fn test_fallback_keeps_six_digits() {
        assert_eq!(fallback_receipt_number(2026, 5), "2026-000005");
        assert_eq!(fallback_receipt_number(2026, 1_760_000_000_000), "2026-000000");
        assert_eq!(fallback_receipt_number(2026, 1_760_123_987_654), "2026-987654");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            receipt_file_name(ReceiptVariant::Default, "2026-000001", 1700),
            "receipt-2026-000001-1700.pdf"
        );
        assert_eq!(
            receipt_file_name(ReceiptVariant::Compact, "2026-000001", 1700),
            "compact-receipt-2026-000001-1700.pdf"
        );
    }

    #[test]
    fn test_prune_count() {
        assert_eq!(prune_count(0, 10), 0);
        assert_eq!(prune_count(10, 10), 1);
        assert_eq!(prune_count(11, 10), 2);
        assert_eq!(prune_count(3, 0), 0);
        assert_eq!(prune_count(1, 1), 1);
    }
}
