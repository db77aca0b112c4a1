//! Server-authoritative pricing.
//!
//! [`price_order`] is the single source of truth for order totals. Checkout stores its output immutably on the order
//! row; invoices and admin views read the stored figures and never recompute them with drifted logic.

use scg_common::Money;
use serde::{Deserialize, Serialize};

/// Tunables for the pricing function. The defaults are the storefront's standard rates; deployments override them
/// through server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Orders with a subtotal at or above this ship for free.
    pub free_shipping_threshold: Money,
    pub flat_shipping_fee: Money,
    /// Tax rate in basis points (1800 = 18%), applied to the discounted subtotal.
    pub tax_rate_bp: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_major(5_000),
            flat_shipping_fee: Money::from_major(200),
            tax_rate_bp: 1_800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// Price an order from its subtotal and an already-validated discount.
///
/// The discount is clamped into `[0, subtotal]` so the total can never go negative, tax is charged on the discounted
/// amount, and `total = subtotal - discount + shipping + tax` holds exactly.
pub fn price_order(subtotal: Money, discount: Money, config: &PricingConfig) -> PricingBreakdown {
    let discount = discount.or_zero().min(subtotal);
    let shipping =
        if subtotal >= config.free_shipping_threshold { Money::ZERO } else { config.flat_shipping_fee };
    let tax = (subtotal - discount).at_basis_points(config.tax_rate_bp);
    let total = subtotal - discount + shipping + tax;
    PricingBreakdown { subtotal, discount, shipping, tax, total }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cfg() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn standard_order_below_free_shipping() {
        // 2 x 100.00, no coupon: 200 + 18% tax (36) + 200 shipping = 436.
        let p = price_order(Money::from_major(200), Money::ZERO, &cfg());
        assert_eq!(p.shipping, Money::from_major(200));
        assert_eq!(p.tax, Money::from_major(36));
        assert_eq!(p.total, Money::from_major(436));
    }

    #[test]
    fn discounted_order() {
        // 200 with a 20 discount: tax is 18% of 180 = 32.40, total 412.40.
        let p = price_order(Money::from_major(200), Money::from_major(20), &cfg());
        assert_eq!(p.tax, Money::from(3_240));
        assert_eq!(p.total, Money::from(41_240));
    }

    #[test]
    fn free_shipping_at_threshold() {
        let p = price_order(Money::from_major(5_000), Money::ZERO, &cfg());
        assert_eq!(p.shipping, Money::ZERO);
        let p = price_order(Money::from(499_999), Money::ZERO, &cfg());
        assert_eq!(p.shipping, Money::from_major(200));
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let p = price_order(Money::from_major(50), Money::from_major(80), &cfg());
        assert_eq!(p.discount, Money::from_major(50));
        assert_eq!(p.tax, Money::ZERO);
        assert_eq!(p.total, Money::from_major(200)); // shipping only
    }

    #[test]
    fn total_identity_holds() {
        for (sub, disc) in [(1, 0), (333, 17), (19_999, 5_000), (500_000, 123_456), (750_000, 0)] {
            let p = price_order(Money::from(sub), Money::from(disc), &cfg());
            assert_eq!(p.total, p.subtotal - p.discount + p.shipping + p.tax);
        }
    }

    #[test]
    fn pricing_is_deterministic() {
        let a = price_order(Money::from(123_456), Money::from(7_890), &cfg());
        let b = price_order(Money::from(123_456), Money::from(7_890), &cfg());
        assert_eq!(a, b);
    }
}
