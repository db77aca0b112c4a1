//! End-to-end checkout behaviour: pricing fidelity, atomic rollback, coupon accounting.

mod support;

use commerce_engine::{
    coupons::CouponError,
    db_types::{CouponKind, NewProduct, OrderStatusType, ProductId},
    test_utils::seed::{fill_cart, percent_coupon, seed_coupon, seed_product},
    traits::{OrderFlowDatabase, OrderFlowError, OrderManagement},
};
use scg_common::Money;
use support::{checkout, new_db, stock_of, try_checkout};

#[tokio::test]
async fn standard_checkout_freezes_prices_and_decrements_stock() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();

    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;
    // 200 subtotal + 36 tax + 200 shipping below the free-shipping threshold.
    assert_eq!(order.subtotal, Money::from_major(200));
    assert_eq!(order.discount, Money::ZERO);
    assert_eq!(order.shipping, Money::from_major(200));
    assert_eq!(order.tax, Money::from_major(36));
    assert_eq!(order.total_price, Money::from_major(436));
    assert_eq!(order.status, OrderStatusType::Pending);

    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].unit_price, Money::from_major(100));
    assert_eq!(placed.items[0].quantity, 2);

    assert_eq!(stock_of(&db, "P1").await, 3);
    assert!(db.fetch_cart("alice").await.unwrap().is_empty(), "checkout must consume the cart");

    let details = db.fetch_order_details(&order.order_id).await.unwrap().unwrap();
    assert_eq!(details.tracking.len(), 1);
    assert_eq!(details.tracking[0].status, OrderStatusType::Pending);
}

#[tokio::test]
async fn coupon_checkout_discounts_and_snapshots() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    let mut coupon = percent_coupon("SAVE10", 10);
    coupon.min_order_value = Some(Money::from_major(100));
    seed_coupon(&db, coupon).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();

    let placed = checkout(&db, "alice", Some("save10")).await; // case-insensitive
    let order = &placed.order;
    assert_eq!(order.discount, Money::from_major(20));
    assert_eq!(order.tax, Money::from(3_240));
    assert_eq!(order.total_price, Money::from(41_240));

    let snapshot = order.coupon_snapshot().expect("coupon snapshot missing");
    assert_eq!(snapshot.code, "SAVE10");
    assert_eq!(snapshot.kind, CouponKind::Percentage);
    assert_eq!(snapshot.value, 10);
    assert_eq!(snapshot.discount, Money::from_major(20));

    let coupon = db.fetch_coupon("SAVE10").await.unwrap().unwrap();
    assert_eq!(coupon.used_count, 1);
}

#[tokio::test]
async fn later_coupon_edits_do_not_touch_historical_orders() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    seed_coupon(&db, percent_coupon("SAVE10", 10)).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", Some("SAVE10")).await;

    // Repricing the product and reusing the code later never alters the stored order.
    seed_product(&db, "P1", 999, 5).await.unwrap();
    let details = db.fetch_order_details(&placed.order.order_id).await.unwrap().unwrap();
    assert_eq!(details.items[0].unit_price, Money::from_major(100));
    assert_eq!(details.order.total_price, placed.order.total_price);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let db = new_db().await;
    let err = try_checkout(&db, "nobody", None).await.expect_err("expected EmptyCart");
    assert!(matches!(err, OrderFlowError::EmptyCart));
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    seed_product(&db, "P2", 50, 1).await.unwrap();
    seed_coupon(&db, percent_coupon("SAVE10", 10)).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2), ("P2", 3)]).await.unwrap();

    let err = try_checkout(&db, "alice", Some("SAVE10")).await.expect_err("expected InsufficientStock");
    match err {
        OrderFlowError::InsufficientStock { product_id, requested, available } => {
            assert_eq!(product_id, ProductId::from("P2"));
            assert_eq!(requested, 3);
            assert_eq!(available, 1);
        },
        e => panic!("unexpected error: {e}"),
    }

    // No partial stock decrement (P1 was reserved before P2 failed), no orphan order, no coupon usage, cart intact.
    assert_eq!(stock_of(&db, "P1").await, 5);
    assert_eq!(stock_of(&db, "P2").await, 1);
    assert!(db.fetch_orders_for_user("alice").await.unwrap().is_empty());
    assert_eq!(db.fetch_coupon("SAVE10").await.unwrap().unwrap().used_count, 0);
    assert_eq!(db.fetch_cart("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_product_aborts_checkout() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    // Remove the product behind the cart's back.
    sqlx::query("DELETE FROM products WHERE id = 'P1'").execute(db.pool()).await.unwrap();

    let err = try_checkout(&db, "alice", None).await.expect_err("expected ProductNotFound");
    assert!(matches!(err, OrderFlowError::ProductNotFound(_)));
    assert!(db.fetch_orders_for_user("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_coupon_code_aborts_checkout() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();

    let err = try_checkout(&db, "alice", Some("NOPE")).await.expect_err("expected InvalidCode");
    assert!(matches!(err, OrderFlowError::Coupon(CouponError::InvalidCode)));
    // The failed coupon lookup must not leak the stock reservation made earlier in the transaction.
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn exhausted_coupon_fails_second_checkout_atomically() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 10).await.unwrap();
    let mut coupon = percent_coupon("ONCE", 10);
    coupon.usage_limit = Some(1);
    seed_coupon(&db, coupon).await.unwrap();

    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    checkout(&db, "alice", Some("ONCE")).await;

    fill_cart(&db, "bob", &[("P1", 1)]).await.unwrap();
    let err = try_checkout(&db, "bob", Some("ONCE")).await.expect_err("expected UsageLimitReached");
    assert!(matches!(err, OrderFlowError::Coupon(CouponError::UsageLimitReached)));
    // Bob's reservation rolled back with the rest of his checkout.
    assert_eq!(stock_of(&db, "P1").await, 9);
    assert_eq!(db.fetch_coupon("ONCE").await.unwrap().unwrap().used_count, 1);
}

#[tokio::test]
async fn subtotal_at_threshold_ships_free() {
    let db = new_db().await;
    seed_product(&db, "BULK", 2_500, 4).await.unwrap();
    fill_cart(&db, "alice", &[("BULK", 2)]).await.unwrap();

    let placed = checkout(&db, "alice", None).await;
    assert_eq!(placed.order.subtotal, Money::from_major(5_000));
    assert_eq!(placed.order.shipping, Money::ZERO);
    assert_eq!(placed.order.tax, Money::from_major(900));
    assert_eq!(placed.order.total_price, Money::from_major(5_900));
}

#[tokio::test]
async fn fixed_coupon_cannot_exceed_order_value() {
    let db = new_db().await;
    seed_product(&db, "P1", 30, 5).await.unwrap();
    let mut coupon = percent_coupon("FLAT50", 0);
    coupon.kind = CouponKind::Fixed;
    coupon.value = Money::from_major(50).value();
    seed_coupon(&db, coupon).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();

    let placed = checkout(&db, "alice", Some("FLAT50")).await;
    assert_eq!(placed.order.discount, Money::from_major(30));
    assert_eq!(placed.order.tax, Money::ZERO);
    // Shipping is still charged on a fully-discounted order.
    assert_eq!(placed.order.total_price, Money::from_major(200));
}

#[tokio::test]
async fn cart_updates_are_last_writer_wins() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    db.set_cart_item("alice", &ProductId::from("P1"), 1).await.unwrap();
    let items = db.set_cart_item("alice", &ProductId::from("P1"), 4).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 4);

    let err = db.set_cart_item("alice", &ProductId::from("GHOST"), 1).await.expect_err("unknown product");
    assert!(matches!(err, OrderFlowError::ProductNotFound(_)));
}

#[tokio::test]
async fn product_upsert_replaces_catalog_entry() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    let updated = db
        .upsert_product(NewProduct {
            id: ProductId::from("P1"),
            name: "Renamed".to_string(),
            price: Money::from_major(120),
            stock: 7,
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.price, Money::from_major(120));
    assert_eq!(updated.stock, 7);
}
