//! The append-only status log. One row per transition, including idempotent same-status updates; the order's cached
//! status column is derived from the latest row here, never the other way around.

use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderStatusType, TrackingEntry, TrackingUpdate},
    traits::OrderFlowError,
};

pub(crate) async fn append_entry(
    order_pk: i64,
    status: OrderStatusType,
    update: &TrackingUpdate,
    conn: &mut SqliteConnection,
) -> Result<TrackingEntry, OrderFlowError> {
    let entry: TrackingEntry = sqlx::query_as(
        "INSERT INTO order_tracking (order_id, status, location, description, metadata) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(order_pk)
    .bind(status)
    .bind(&update.location)
    .bind(&update.description)
    .bind(&update.metadata)
    .fetch_one(conn)
    .await?;
    trace!("🛤️️ Tracking entry {} appended for order id {order_pk}: {status}", entry.id);
    Ok(entry)
}

/// The status of the most recent tracking row — the order's true current status. Read this inside the same
/// transaction as the row you are about to append, so concurrent status changes serialize.
pub(crate) async fn latest_status(
    order_pk: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderStatusType>, sqlx::Error> {
    let status: Option<(OrderStatusType,)> =
        sqlx::query_as("SELECT status FROM order_tracking WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(order_pk)
            .fetch_optional(conn)
            .await?;
    Ok(status.map(|s| s.0))
}

pub async fn history_for_order(
    order_pk: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TrackingEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM order_tracking WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_pk)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
