use log::debug;
use scg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{PaymentIntent, PaymentIntentStatus},
    traits::OrderFlowError,
};

pub async fn fetch_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent = sqlx::query_as("SELECT * FROM payment_intents WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(intent)
}

/// The order's current non-terminal intent, if any. The schema enforces at most one through a partial unique index.
pub(crate) async fn open_intent_for_order(
    order_pk: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentIntent>, sqlx::Error> {
    let intent = sqlx::query_as(
        "SELECT * FROM payment_intents WHERE order_id = $1 AND status IN ('pending', 'processing')",
    )
    .bind(order_pk)
    .fetch_optional(conn)
    .await?;
    Ok(intent)
}

pub(crate) async fn insert_intent(
    payment_id: &str,
    order_pk: i64,
    amount: Money,
    metadata: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, OrderFlowError> {
    let intent: PaymentIntent = sqlx::query_as(
        "INSERT INTO payment_intents (payment_id, order_id, amount, metadata) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(payment_id)
    .bind(order_pk)
    .bind(amount)
    .bind(metadata)
    .fetch_one(conn)
    .await?;
    debug!("💳️ Payment intent [{payment_id}] created for order id {order_pk}");
    Ok(intent)
}

pub(crate) async fn update_status(
    payment_id: &str,
    status: PaymentIntentStatus,
    conn: &mut SqliteConnection,
) -> Result<PaymentIntent, OrderFlowError> {
    let intent: Option<PaymentIntent> = sqlx::query_as(
        "UPDATE payment_intents SET status = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE payment_id = $2 RETURNING *",
    )
    .bind(status)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    intent.ok_or_else(|| OrderFlowError::PaymentIntentNotFound(payment_id.to_string()))
}
