//! The stock ledger. These functions are the only writers of `products.stock` in the entire system.

use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product, ProductId},
    traits::OrderFlowError,
};

pub async fn fetch_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, OrderFlowError> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = excluded.name, price = excluded.price, stock = excluded.stock,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(product.id)
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

/// Reserve `quantity` units of the product, failing without a write if not enough are available.
///
/// The check and the decrement are one conditional UPDATE, so two concurrent checkouts cannot both pass validation
/// against the same stale stock figure. Returns the remaining stock.
pub(crate) async fn reserve_stock(
    id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderFlowError> {
    let remaining: Option<(i64,)> = sqlx::query_as(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND stock >= $1 RETURNING stock",
    )
    .bind(quantity)
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match remaining {
        Some((stock,)) => {
            debug!("📦️ Reserved {quantity} x {id}. {stock} remaining");
            Ok(stock)
        },
        None => match fetch_product(id, conn).await? {
            Some(product) => Err(OrderFlowError::InsufficientStock {
                product_id: id.clone(),
                requested: quantity,
                available: product.stock,
            }),
            None => Err(OrderFlowError::ProductNotFound(id.clone())),
        },
    }
}

/// Return previously reserved units to the shelf. Callers gate this on the status graph's release rule so the same
/// reservation is never restored twice.
pub(crate) async fn release_stock(
    id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    let updated = sqlx::query(
        "UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(quantity)
    .bind(id.as_str())
    .execute(conn)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(OrderFlowError::ProductNotFound(id.clone()));
    }
    debug!("📦️ Released {quantity} x {id} back to stock");
    Ok(())
}

/// Apply a signed stock correction. Negative deltas use the same conditional form as [`reserve_stock`] so a
/// correction can never drive stock below zero.
pub(crate) async fn adjust_stock(
    id: &ProductId,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<Product, OrderFlowError> {
    if delta < 0 {
        reserve_stock(id, -delta, &mut *conn).await?;
    } else {
        release_stock(id, delta, &mut *conn).await?;
    }
    fetch_product(id, conn).await?.ok_or_else(|| OrderFlowError::ProductNotFound(id.clone()))
}
