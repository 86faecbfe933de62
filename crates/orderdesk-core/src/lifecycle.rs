//! # Order Lifecycle Rules
//!
//! Pure guards for every state-changing order and receipt operation. The
//! database layer calls these inside its transactions, so the rules live in
//! one place and are tested without a database.
//!
//! | operation        | allowed from            | otherwise             |
//! |------------------|-------------------------|-----------------------|
//! | update           | draft                   | InvalidOrderStatus    |
//! | confirm          | draft                   | InvalidOrderStatus    |
//! | cancel           | draft, confirmed        | OrderAlreadyCancelled |
//! | delete           | any                     | -                     |
//! | generate receipt | confirmed, no live one  | InvalidOrderStatus / ReceiptExists |

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus, Receipt, ReceiptStatus};

/// Recipient and items may only change while the order is a draft.
pub fn ensure_editable(order: &Order) -> CoreResult<()> {
    require_draft(order, "update")
}

/// Confirmation is a pure `draft → confirmed` transition.
pub fn ensure_confirmable(order: &Order) -> CoreResult<()> {
    require_draft(order, "confirm")
}

/// Cancelling twice is an error, not a no-op.
pub fn ensure_cancellable(order: &Order) -> CoreResult<()> {
    match order.status {
        OrderStatus::Cancelled => Err(CoreError::OrderAlreadyCancelled),
        OrderStatus::Draft | OrderStatus::Confirmed => Ok(()),
    }
}

/// A receipt needs a confirmed order without a live receipt.
pub fn ensure_receipt_allowed(order: &Order, existing: &[Receipt]) -> CoreResult<()> {
    if order.status != OrderStatus::Confirmed {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            current_status: order.status,
            action: "generate a receipt for",
        });
    }

    if existing
        .iter()
        .any(|r| r.order_id == order.id && r.status == ReceiptStatus::Generated)
    {
        return Err(CoreError::ReceiptExists(order.id.clone()));
    }

    Ok(())
}

/// Only a generated receipt can be voided.
pub fn ensure_voidable(receipt: &Receipt) -> CoreResult<()> {
    match receipt.status {
        ReceiptStatus::Generated => Ok(()),
        ReceiptStatus::Void => Err(CoreError::ReceiptAlreadyVoid(receipt.id.clone())),
    }
}

fn require_draft(order: &Order, action: &'static str) -> CoreResult<()> {
    if order.status == OrderStatus::Draft {
        Ok(())
    } else {
        Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            current_status: order.status,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use crate::types::ReceiptVariant;
    use chrono::Utc;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: "o-1".to_string(),
            recipient_id: "r-1".to_string(),
            status,
            subtotal_cents: 100,
            total_cents: 100,
            currency: Currency::Uah,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn receipt(status: ReceiptStatus) -> Receipt {
        Receipt {
            id: "rc-1".to_string(),
            order_id: "o-1".to_string(),
            number: "2026-000001".to_string(),
            variant: ReceiptVariant::Default,
            pdf_url: None,
            pdf_path: None,
            hash: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirm_only_from_draft() {
        assert!(ensure_confirmable(&order(OrderStatus::Draft)).is_ok());
        assert!(ensure_confirmable(&order(OrderStatus::Confirmed)).is_err());
        assert!(ensure_confirmable(&order(OrderStatus::Cancelled)).is_err());
    }

    #[test]
    fn test_update_only_from_draft() {
        assert!(ensure_editable(&order(OrderStatus::Draft)).is_ok());
        let err = ensure_editable(&order(OrderStatus::Confirmed)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOrderStatus { action: "update", .. }));
    }

    #[test]
    fn test_cancel_rules() {
        assert!(ensure_cancellable(&order(OrderStatus::Draft)).is_ok());
        assert!(ensure_cancellable(&order(OrderStatus::Confirmed)).is_ok());
        assert!(matches!(
            ensure_cancellable(&order(OrderStatus::Cancelled)),
            Err(CoreError::OrderAlreadyCancelled)
        ));
    }

    #[test]
    fn test_receipt_rules() {
        assert!(ensure_receipt_allowed(&order(OrderStatus::Draft), &[]).is_err());
        assert!(ensure_receipt_allowed(&order(OrderStatus::Confirmed), &[]).is_ok());
        assert!(matches!(
            ensure_receipt_allowed(
                &order(OrderStatus::Confirmed),
                &[receipt(ReceiptStatus::Generated)]
            ),
            Err(CoreError::ReceiptExists(_))
        ));
        // a void receipt does not block a new one
        assert!(
            ensure_receipt_allowed(&order(OrderStatus::Confirmed), &[receipt(ReceiptStatus::Void)])
                .is_ok()
        );
    }

    #[test]
    fn test_void_rules() {
        assert!(ensure_voidable(&receipt(ReceiptStatus::Generated)).is_ok());
        assert!(ensure_voidable(&receipt(ReceiptStatus::Void)).is_err());
    }
}
