use log::debug;
use sqlx::SqliteConnection;

use crate::{
    coupons::CouponError,
    db_types::{Coupon, NewCoupon},
    traits::OrderFlowError,
};

/// Case-insensitive coupon lookup (the `code` column is `COLLATE NOCASE`).
pub async fn fetch_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    let coupon = sqlx::query_as("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_optional(conn).await?;
    Ok(coupon)
}

pub(crate) async fn insert_coupon(coupon: NewCoupon, conn: &mut SqliteConnection) -> Result<Coupon, OrderFlowError> {
    let code = coupon.code.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO coupons (code, kind, value, min_order_value, max_discount, usage_limit, valid_from,
                                 valid_until, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(coupon.code)
    .bind(coupon.kind)
    .bind(coupon.value)
    .bind(coupon.min_order_value)
    .bind(coupon.max_discount)
    .bind(coupon.usage_limit)
    .bind(coupon.valid_from)
    .bind(coupon.valid_until)
    .bind(coupon.is_active)
    .fetch_one(conn)
    .await;
    match result {
        Ok(coupon) => Ok(coupon),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(OrderFlowError::CouponAlreadyExists(code)),
        Err(e) => Err(e.into()),
    }
}

/// Consume one use of the coupon, atomically, respecting the usage cap.
///
/// The guard lives in the UPDATE itself, so two checkouts racing for the last use cannot both win: the loser's
/// statement matches no row and the whole checkout rolls back with `UsageLimitReached`.
pub(crate) async fn increment_usage(coupon_id: i64, conn: &mut SqliteConnection) -> Result<i64, OrderFlowError> {
    let used: Option<(i64,)> = sqlx::query_as(
        "UPDATE coupons SET used_count = used_count + 1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND (usage_limit IS NULL OR used_count < usage_limit) RETURNING used_count",
    )
    .bind(coupon_id)
    .fetch_optional(conn)
    .await?;
    match used {
        Some((count,)) => {
            debug!("🎟️️ Coupon {coupon_id} usage incremented to {count}");
            Ok(count)
        },
        None => Err(CouponError::UsageLimitReached.into()),
    }
}
