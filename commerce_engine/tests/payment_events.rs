//! Payment-provider reconciliation: at-least-once delivery, out-of-order events, and exactly-once stock release.

mod support;

use commerce_engine::{
    db_types::{OrderStatusType, PaymentIntentStatus, TrackingUpdate},
    test_utils::seed::{fill_cart, seed_product},
    traits::{OrderFlowDatabase, OrderFlowError, OrderManagement, PaymentEventKind, PaymentEventOutcome},
};
use support::{checkout, event, new_db, stock_of};
use PaymentEventKind::*;

#[tokio::test]
async fn created_then_succeeded_marks_order_paid() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    let outcome = db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    assert_eq!(outcome, PaymentEventOutcome::Recorded);
    let intent = db.fetch_payment_intent("pi_1").await.unwrap().unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Pending);
    assert_eq!(intent.amount, order.total_price);

    let outcome = db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    match outcome {
        PaymentEventOutcome::Applied(updated) => assert_eq!(updated.status, OrderStatusType::Paid),
        o => panic!("expected Applied, got {o:?}"),
    }
    assert_eq!(db.fetch_payment_intent("pi_1").await.unwrap().unwrap().status, PaymentIntentStatus::Succeeded);
    // Success never touches stock.
    assert_eq!(stock_of(&db, "P1").await, 3);
}

#[tokio::test]
async fn duplicate_succeeded_is_idempotent() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    let replay = db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    assert_eq!(replay, PaymentEventOutcome::AlreadyProcessed);

    let details = db.fetch_order_details(&order.order_id).await.unwrap().unwrap();
    let paid_rows = details.tracking.iter().filter(|t| t.status == OrderStatusType::Paid).count();
    assert_eq!(paid_rows, 1, "a replayed success event must not append a second paid entry");
    assert_eq!(stock_of(&db, "P1").await, 3);
}

#[tokio::test]
async fn duplicate_created_is_idempotent() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;

    db.apply_payment_event(event(Created, "pi_1", &placed.order)).await.unwrap();
    let replay = db.apply_payment_event(event(Created, "pi_1", &placed.order)).await.unwrap();
    assert_eq!(replay, PaymentEventOutcome::AlreadyProcessed);
}

#[tokio::test]
async fn failure_after_paid_restores_stock_exactly_once() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    assert_eq!(stock_of(&db, "P1").await, 3);

    // The capture is reversed after the optimistic success: a second (retry) intent fails.
    db.apply_payment_event(event(Created, "pi_2", order)).await.unwrap();
    let outcome = db.apply_payment_event(event(PaymentFailed, "pi_2", order)).await.unwrap();
    match outcome {
        PaymentEventOutcome::Applied(updated) => assert_eq!(updated.status, OrderStatusType::Failed),
        o => panic!("expected Applied, got {o:?}"),
    }
    assert_eq!(stock_of(&db, "P1").await, 5, "a failed payment releases the reserved inventory");

    // Redelivery of the failure must not release again.
    let replay = db.apply_payment_event(event(PaymentFailed, "pi_2", order)).await.unwrap();
    assert_eq!(replay, PaymentEventOutcome::AlreadyProcessed);
    assert_eq!(stock_of(&db, "P1").await, 5);

    // Nor does the follow-up bookkeeping cancel of the failed order.
    db.set_order_status(&order.order_id, OrderStatusType::Cancelled, TrackingUpdate::with_description("Cleanup"))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn refund_restores_stock_and_is_idempotent() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 2)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();

    let outcome = db.apply_payment_event(event(Refunded, "pi_1", order)).await.unwrap();
    match outcome {
        PaymentEventOutcome::Applied(updated) => assert_eq!(updated.status, OrderStatusType::Refunded),
        o => panic!("expected Applied, got {o:?}"),
    }
    assert_eq!(stock_of(&db, "P1").await, 5);
    assert_eq!(db.fetch_payment_intent("pi_1").await.unwrap().unwrap().status, PaymentIntentStatus::Refunded);

    let replay = db.apply_payment_event(event(Refunded, "pi_1", order)).await.unwrap();
    assert_eq!(replay, PaymentEventOutcome::AlreadyProcessed);
    assert_eq!(stock_of(&db, "P1").await, 5);
}

#[tokio::test]
async fn early_processing_event_is_informational_only() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    // Providers do not guarantee processing-before-succeeded ordering. Arriving first, it must not move the order.
    let outcome = db.apply_payment_event(event(Processing, "pi_1", order)).await.unwrap();
    assert_eq!(outcome, PaymentEventOutcome::Recorded);
    assert_eq!(db.fetch_order_by_order_id(&order.order_id).await.unwrap().unwrap().status, OrderStatusType::Pending);
    assert_eq!(db.fetch_payment_intent("pi_1").await.unwrap().unwrap().status, PaymentIntentStatus::Processing);

    // The success event still lands the order on paid.
    db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    assert_eq!(db.fetch_order_by_order_id(&order.order_id).await.unwrap().unwrap().status, OrderStatusType::Paid);
}

#[tokio::test]
async fn processing_after_paid_moves_the_order_along() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    db.apply_payment_event(event(Succeeded, "pi_1", order)).await.unwrap();
    // A second attempt's processing signal after the order is paid is a real fulfilment transition.
    db.apply_payment_event(event(Created, "pi_2", order)).await.unwrap();
    let outcome = db.apply_payment_event(event(Processing, "pi_2", order)).await.unwrap();
    match outcome {
        PaymentEventOutcome::Applied(updated) => assert_eq!(updated.status, OrderStatusType::Processing),
        o => panic!("expected Applied, got {o:?}"),
    }
}

#[tokio::test]
async fn at_most_one_open_intent_per_order() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    db.apply_payment_event(event(Created, "pi_1", order)).await.unwrap();
    let err = db.apply_payment_event(event(Created, "pi_2", order)).await.expect_err("second open intent");
    assert!(matches!(err, OrderFlowError::OpenIntentExists { .. }));

    // Once the first intent fails, a retry intent is welcome.
    db.apply_payment_event(event(PaymentFailed, "pi_1", order)).await.unwrap();
    db.apply_payment_event(event(Created, "pi_2", order)).await.unwrap();
}

#[tokio::test]
async fn events_for_unknown_intents_or_orders_are_rejected() {
    let db = new_db().await;
    seed_product(&db, "P1", 100, 5).await.unwrap();
    fill_cart(&db, "alice", &[("P1", 1)]).await.unwrap();
    let placed = checkout(&db, "alice", None).await;
    let order = &placed.order;

    let err = db.apply_payment_event(event(Succeeded, "pi_ghost", order)).await.expect_err("no such intent");
    assert!(matches!(err, OrderFlowError::PaymentIntentNotFound(_)));

    let mut stray = event(Created, "pi_1", order);
    stray.order_id = "ord-doesnotexist".parse().unwrap();
    let err = db.apply_payment_event(stray).await.expect_err("no such order");
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
}
