//! # SQLite database methods
//!
//! Low-level query functions, one module per table. Everything takes a `&mut SqliteConnection`, so callers can run a
//! single statement on a pooled connection or compose several into an atomic transaction by passing `&mut *tx`.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod carts;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod products;
pub mod tracking;

const SQLITE_DB_URL: &str = "sqlite://data/scg_store.db";

pub fn db_url() -> String {
    let result = env::var("SCG_DATABASE_URL").unwrap_or_else(|_| {
        info!("SCG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
