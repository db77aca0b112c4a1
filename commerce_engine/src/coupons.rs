//! Coupon rule evaluation and discount computation.
//!
//! Validation is pure: callers fetch the coupon row inside their transaction and evaluate it here, so that the
//! decision and the later usage increment cannot race a concurrent edit. Rules run in a fixed order and the first
//! failure wins, which keeps the error a customer sees stable across retries.

use chrono::{DateTime, Utc};
use scg_common::Money;
use thiserror::Error;

use crate::db_types::{Coupon, CouponKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("This coupon code does not exist")]
    InvalidCode,
    #[error("This coupon is no longer active")]
    Inactive,
    #[error("This coupon is not valid yet")]
    NotYetValid,
    #[error("This coupon has expired")]
    Expired,
    #[error("This coupon has reached its usage limit")]
    UsageLimitReached,
    #[error("This coupon requires a minimum order value of {minimum}")]
    BelowMinimum { minimum: Money },
}

/// Evaluate a coupon against an order subtotal, returning the discount it grants.
pub fn validate_coupon(coupon: &Coupon, subtotal: Money, now: DateTime<Utc>) -> Result<Money, CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }
    if now < coupon.valid_from {
        return Err(CouponError::NotYetValid);
    }
    if now > coupon.valid_until {
        return Err(CouponError::Expired);
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Err(CouponError::UsageLimitReached);
        }
    }
    if let Some(minimum) = coupon.min_order_value {
        if subtotal < minimum {
            return Err(CouponError::BelowMinimum { minimum });
        }
    }
    Ok(discount_for(coupon, subtotal))
}

/// The discount a (valid) coupon grants on the given subtotal. Never negative, never more than the subtotal.
pub fn discount_for(coupon: &Coupon, subtotal: Money) -> Money {
    let raw = match coupon.kind {
        CouponKind::Percentage => {
            let discount = subtotal.percent(coupon.value);
            match coupon.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        },
        CouponKind::Fixed => Money::from(coupon.value),
    };
    raw.min(subtotal).or_zero()
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn coupon(kind: CouponKind, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: 1,
            code: "SAVE10".to_string(),
            kind,
            value,
            min_order_value: None,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_discount() {
        let c = coupon(CouponKind::Percentage, 10);
        let discount = validate_coupon(&c, Money::from_major(200), Utc::now()).unwrap();
        assert_eq!(discount, Money::from_major(20));
    }

    #[test]
    fn percentage_respects_max_discount() {
        let mut c = coupon(CouponKind::Percentage, 50);
        c.max_discount = Some(Money::from_major(30));
        assert_eq!(discount_for(&c, Money::from_major(200)), Money::from_major(30));
    }

    #[test]
    fn fixed_discount_capped_at_subtotal() {
        let c = coupon(CouponKind::Fixed, 50_000);
        assert_eq!(discount_for(&c, Money::from_major(120)), Money::from_major(120));
    }

    #[test]
    fn rule_order_first_failure_wins() {
        let mut c = coupon(CouponKind::Percentage, 10);
        c.is_active = false;
        c.usage_limit = Some(1);
        c.used_count = 1;
        // Inactive outranks the exhausted usage limit.
        assert_eq!(validate_coupon(&c, Money::from_major(200), Utc::now()), Err(CouponError::Inactive));
    }

    #[test]
    fn validity_window() {
        let c = coupon(CouponKind::Percentage, 10);
        let too_early = c.valid_from - Duration::hours(1);
        let too_late = c.valid_until + Duration::hours(1);
        assert_eq!(validate_coupon(&c, Money::from_major(200), too_early), Err(CouponError::NotYetValid));
        assert_eq!(validate_coupon(&c, Money::from_major(200), too_late), Err(CouponError::Expired));
    }

    #[test]
    fn usage_limit_reached() {
        let mut c = coupon(CouponKind::Percentage, 10);
        c.usage_limit = Some(1);
        c.used_count = 1;
        assert_eq!(validate_coupon(&c, Money::from_major(200), Utc::now()), Err(CouponError::UsageLimitReached));
    }

    #[test]
    fn minimum_order_value() {
        let mut c = coupon(CouponKind::Percentage, 10);
        c.min_order_value = Some(Money::from_major(100));
        let err = validate_coupon(&c, Money::from_major(99), Utc::now());
        assert_eq!(err, Err(CouponError::BelowMinimum { minimum: Money::from_major(100) }));
        assert!(validate_coupon(&c, Money::from_major(100), Utc::now()).is_ok());
    }
}
