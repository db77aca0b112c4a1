//! Status graph enforcement across the admin/user mutation surface: guarded transitions, exactly-once stock
//! restoration, bulk partial-failure semantics and stale-order expiry.

mod support;

use chrono::Duration;
use commerce_engine::{
    db_types::{OrderStatusType, ProductId, TrackingUpdate},
    events::EventProducers,
    test_utils::seed::{fill_cart, seed_product},
    traits::{OrderFlowDatabase, OrderFlowError, OrderManagement, StatusUpdateItem, StockAdjustment},
    OrderFlowApi,
};
use support::{checkout, new_db, stock_of};
use OrderStatusType::*;

#[tokio::test]
async fn illegal_admin_jump_is_rejected() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;

    let err = db
        .set_order_status(&placed.order.order_id, Shipped, TrackingUpdate::with_description("Skipping ahead"))
        .await
        .expect_err("pending -> shipped is not in the table");
    match err {
        OrderFlowError::IllegalTransition(t) => {
            assert_eq!(t.from, Pending);
            assert_eq!(t.to, Shipped);
        },
        e => panic!("unexpected error: {e}"),
    }
    // The rejected transition left no trace.
    let details = db.fetch_order_details(&placed.order.order_id).await.unwrap().unwrap();
    assert_eq!(details.order.status, Pending);
    assert_eq!(details.tracking.len(), 1);
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    assert_eq!(stock_of(&db, "P1").await, 3);

    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let order = api.cancel_order(&placed.order.order_id, "Changed my mind").await.unwrap();
    assert_eq!(order.status, Cancelled);
    assert_eq!(stock_of(&db, "P1").await, 5);

    // Cancelled is terminal; a second cancel is an idempotent no-op update and must not restore again.
    let (order, _) = db
        .set_order_status(&placed.order.order_id, Cancelled, TrackingUpdate::with_description("Retry"))
        .await
        .unwrap();
    assert_eq!(order.status, Cancelled);
    assert_eq!(stock_of(&db, "P1").await, 5);

    // And any attempt to leave the terminal state is rejected.
    let err = db
        .set_order_status(&placed.order.order_id, Pending, TrackingUpdate::with_description("Undo"))
        .await
        .expect_err("cancelled is terminal");
    assert!(matches!(err, OrderFlowError::IllegalTransition(_)));
}

#[tokio::test]
async fn same_status_update_succeeds_silently_and_is_logged() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;

    let (order, entry) = db
        .set_order_status(&placed.order.order_id, Pending, TrackingUpdate::with_description("Still pending"))
        .await
        .expect("same-status update must succeed");
    assert_eq!(order.status, Pending);
    assert_eq!(entry.status, Pending);

    let details = db.fetch_order_details(&placed.order.order_id).await.unwrap().unwrap();
    assert_eq!(details.tracking.len(), 2, "idempotent updates still append their row");
}

#[tokio::test]
async fn happy_path_to_delivery_then_refund() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let oid = &placed.order.order_id;

    for (status, note) in [
        (Paid, "Payment confirmed manually"),
        (Processing, "Packing"),
        (Shipped, "Handed to courier"),
        (Delivered, "Left at door"),
    ] {
        db.set_order_status(oid, status, TrackingUpdate::with_description(note)).await.unwrap();
    }
    let details = db.fetch_order_details(oid).await.unwrap().unwrap();
    assert_eq!(details.order.status, Delivered);
    assert_eq!(details.tracking.len(), 5);
    assert_eq!(stock_of(&db, "P1").await, 3, "delivery does not touch stock");

    // A refund after delivery returns the goods to stock.
    db.set_order_status(oid, Refunded, TrackingUpdate::with_description("Customer return")).await.unwrap();
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn tracking_rows_carry_location_and_metadata() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;

    let update = TrackingUpdate {
        description: "Payment confirmed manually".to_string(),
        location: Some("Mumbai warehouse".to_string()),
        metadata: Some(r#"{"operator":"jo"}"#.to_string()),
    };
    let (_, entry) = db.set_order_status(&placed.order.order_id, Paid, update).await.unwrap();
    assert_eq!(entry.location.as_deref(), Some("Mumbai warehouse"));
    assert_eq!(entry.metadata.as_deref(), Some(r#"{"operator":"jo"}"#));
}

#[tokio::test]
async fn bulk_status_update_collects_per_item_failures() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 10).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let first = checkout(&db, "alice", None).await;
    fill_cart(&db, "bob", &[("P1", 1)]).await.unwrap();
    let second = checkout(&db, "bob", None).await;

    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let outcome = api
        .bulk_update_statuses(vec![
            StatusUpdateItem { order_id: first.order.order_id.clone(), status: Paid, description: None },
            StatusUpdateItem { order_id: second.order.order_id.clone(), status: Shipped, description: None },
            StatusUpdateItem { order_id: "ord-doesnotexist".parse().unwrap(), status: Paid, description: None },
        ])
        .await;

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 2);
    assert!(outcome.results[0].success);
    assert!(!outcome.results[1].success);
    assert!(outcome.results[1].message.contains("pending"));
    assert!(!outcome.results[2].success);

    // The failed rows were untouched; the good row went through.
    assert_eq!(db.fetch_order_by_order_id(&first.order.order_id).await.unwrap().unwrap().status, Paid);
    assert_eq!(db.fetch_order_by_order_id(&second.order.order_id).await.unwrap().unwrap().status, Pending);
}

#[tokio::test]
async fn bulk_stock_adjustment_has_partial_failure_semantics() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    seed_product(&db, "P2", 100, 2).await.unwrap();

    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let outcome = api
        .bulk_adjust_stock(vec![
            StockAdjustment { product_id: ProductId::from("P1"), delta: 5 },
            StockAdjustment { product_id: ProductId::from("P2"), delta: -3 },
            StockAdjustment { product_id: ProductId::from("GHOST"), delta: 1 },
        ])
        .await;

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 2);
    assert_eq!(stock_of(&db, "P1").await, 10);
    // The over-draining correction was refused outright.
    assert_eq!(stock_of(&db, "P2").await, 2);
}

#[tokio::test]
async fn stale_pending_orders_are_expired_through_the_state_machine() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    fill_cart(&db, "bob", &[("P1", 1)]).await.unwrap();
    let fresh = checkout(&db, "bob", None).await;

    // Age only Alice's order past the cutoff.
    sqlx::query("UPDATE orders SET updated_at = datetime('now', '-3 hours') WHERE order_id = $1")
        .bind(placed.order.order_id.as_str())
        .execute(db.pool())
        .await
        .unwrap();

    let expired = db.expire_stale_pending_orders(Duration::hours(2)).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].order_id, placed.order.order_id);
    assert_eq!(expired[0].status, Cancelled);
    // Alice's two units came back; Bob's reservation stands.
    assert_eq!(stock_of(&db, "P1").await, 4);
    assert_eq!(db.fetch_order_by_order_id(&fresh.order.order_id).await.unwrap().unwrap().status, Pending);

    let details = db.fetch_order_details(&placed.order.order_id).await.unwrap().unwrap();
    assert_eq!(details.tracking.last().unwrap().status, Cancelled);
}
