use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType},
    traits::OrderFlowError,
};

/// Insert a fully-priced order. The status column takes its schema default (`pending`); the matching tracking row is
/// the caller's responsibility, inside the same transaction.
pub(crate) async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let (coupon_code, coupon_kind, coupon_value) = match &order.coupon {
        Some(c) => (Some(c.code.clone()), Some(c.kind), Some(c.value)),
        None => (None, None, None),
    };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                subtotal,
                discount,
                shipping,
                tax,
                total_price,
                coupon_code,
                coupon_kind,
                coupon_value
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.shipping)
    .bind(order.tax)
    .bind(order.total_price)
    .bind(coupon_code)
    .bind(coupon_kind)
    .bind(coupon_value)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub(crate) async fn insert_order_items(
    order_pk: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderFlowError> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let row: OrderItem = sqlx::query_as(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(order_pk)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn items_for_order(order_pk: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_pk)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.unwrap_or_default().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {} rows", orders.len());
    Ok(orders)
}

/// Refresh the cached status column from the tracking log's verdict. Only the tracking recorder calls this, right
/// after appending the row that makes `status` true.
pub(crate) async fn update_cached_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(OrderFlowError::OrderIdNotFound(id))
}

/// Pending orders whose last update is older than the given limit. Candidates for expiry.
pub(crate) async fn stale_pending_orders(
    limit: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let rows = sqlx::query_as(
        "SELECT * FROM orders WHERE status = 'pending' AND \
         (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1",
    )
    .bind(limit.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
