//! The order status graph.
//!
//! Every code path that changes an order's status — user cancel, admin update, bulk update, payment webhook — goes
//! through [`validate_transition`]. There is no alternate path that writes the status column directly.

use thiserror::Error;

use crate::db_types::OrderStatusType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot move an order from {from} to {to}")]
pub struct IllegalTransition {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}

/// The statuses an order may move to from `from`. A transition to the *same* status is always allowed and is not
/// listed here; retried webhook deliveries resend the same target status and must succeed silently.
pub fn allowed_transitions(from: OrderStatusType) -> &'static [OrderStatusType] {
    use OrderStatusType::*;
    match from {
        Pending => &[Paid, Cancelled, Failed],
        // Paid orders can fail: the provider may reverse an optimistic capture after the success event.
        Paid => &[Processing, Cancelled, Refunded, Failed],
        Processing => &[Shipped, Cancelled, Refunded],
        Shipped => &[Delivered],
        Delivered => &[Refunded],
        Cancelled => &[],
        Refunded => &[],
        Failed => &[Cancelled],
    }
}

pub fn is_valid_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
    from == to || allowed_transitions(from).contains(&to)
}

pub fn validate_transition(from: OrderStatusType, to: OrderStatusType) -> Result<(), IllegalTransition> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Whether moving `from → to` must return the order's reserved stock to the shelf.
///
/// Stock is reserved exactly once (at checkout) and so must be released exactly once: on the first entry into
/// `cancelled`, `refunded` or `failed`. A later `failed → cancelled` bookkeeping move finds the reservation already
/// released and does nothing.
pub fn releases_stock(from: OrderStatusType, to: OrderStatusType) -> bool {
    use OrderStatusType::*;
    let released = |s| matches!(s, Cancelled | Refunded | Failed);
    from != to && !released(from) && released(to)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::OrderStatusType::*;

    #[test]
    fn same_status_is_always_valid() {
        for status in OrderStatusType::ALL {
            assert!(is_valid_transition(status, status), "{status} -> {status} must be a valid no-op");
        }
    }

    #[test]
    fn table_is_complete() {
        // Every (from, to) pair is either in the table or rejected. No third outcome.
        let expect = |from, to| {
            let allowed = allowed_transitions(from).contains(&to);
            assert_eq!(
                is_valid_transition(from, to),
                allowed || from == to,
                "unexpected verdict for {from} -> {to}"
            );
        };
        for from in OrderStatusType::ALL {
            for to in OrderStatusType::ALL {
                expect(from, to);
            }
        }
    }

    #[test]
    fn terminal_states_allow_nothing_new() {
        for to in OrderStatusType::ALL {
            if to != Cancelled {
                assert!(!is_valid_transition(Cancelled, to));
            }
            if to != Refunded {
                assert!(!is_valid_transition(Refunded, to));
            }
        }
    }

    #[test]
    fn rejected_examples_from_the_field() {
        assert_eq!(validate_transition(Pending, Shipped), Err(IllegalTransition { from: Pending, to: Shipped }));
        assert!(validate_transition(Shipped, Processing).is_err());
        assert!(validate_transition(Delivered, Cancelled).is_err());
        assert!(validate_transition(Failed, Paid).is_err());
        assert!(validate_transition(Paid, Failed).is_ok());
        assert!(validate_transition(Failed, Cancelled).is_ok());
    }

    #[test]
    fn stock_release_happens_exactly_once() {
        assert!(releases_stock(Pending, Cancelled));
        assert!(releases_stock(Paid, Failed));
        assert!(releases_stock(Processing, Refunded));
        assert!(releases_stock(Delivered, Refunded));
        // Already released when the order failed; cancelling afterwards must not release again.
        assert!(!releases_stock(Failed, Cancelled));
        assert!(!releases_stock(Cancelled, Cancelled));
        // Success paths never touch stock.
        assert!(!releases_stock(Pending, Paid));
        assert!(!releases_stock(Shipped, Delivered));
    }
}
