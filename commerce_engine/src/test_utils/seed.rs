//! Seed helpers for integration tests: catalog products, carts and coupons with sensible defaults.

use chrono::{Duration, Utc};
use scg_common::Money;

use crate::{
    db_types::{Coupon, CouponKind, NewCoupon, NewProduct, Product, ProductId},
    traits::{OrderFlowDatabase, OrderFlowError},
};

pub async fn seed_product<B: OrderFlowDatabase>(
    db: &B,
    id: &str,
    price_major: i64,
    stock: i64,
) -> Result<Product, OrderFlowError> {
    db.upsert_product(NewProduct {
        id: ProductId::from(id),
        name: format!("Test product {id}"),
        price: Money::from_major(price_major),
        stock,
    })
    .await
}

pub async fn fill_cart<B: OrderFlowDatabase>(
    db: &B,
    user_id: &str,
    items: &[(&str, i64)],
) -> Result<(), OrderFlowError> {
    for (product_id, quantity) in items {
        db.set_cart_item(user_id, &ProductId::from(*product_id), *quantity).await?;
    }
    Ok(())
}

/// A percentage coupon valid from yesterday to tomorrow. Adjust the returned fields via `create_coupon` input if a
/// test needs caps or usage limits.
pub fn percent_coupon(code: &str, value: i64) -> NewCoupon {
    let now = Utc::now();
    NewCoupon {
        code: code.to_string(),
        kind: CouponKind::Percentage,
        value,
        min_order_value: None,
        max_discount: None,
        usage_limit: None,
        valid_from: now - Duration::days(1),
        valid_until: now + Duration::days(1),
        is_active: true,
    }
}

pub async fn seed_coupon<B: OrderFlowDatabase>(db: &B, coupon: NewCoupon) -> Result<Coupon, OrderFlowError> {
    db.create_coupon(coupon).await
}
