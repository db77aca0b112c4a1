use chrono::Duration;
use commerce_engine::{db_types::Order, events::EventProducers, OrderFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the pending-order expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Expiry runs through the normal status path, so every cancelled order gets its tracking row and its stock back.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    pending_expiry: Duration,
    check_interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(check_interval);
        let api = OrderFlowApi::new(db, producers);
        info!("🕰️ Pending order expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running pending order expiry job");
            match api.expire_stale_pending_orders(pending_expiry).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No stale pending orders"),
                Ok(expired) => {
                    info!("🕰️ {} stale pending orders cancelled: {}", expired.len(), order_list(&expired));
                },
                Err(e) => error!("🕰️ Error running pending order expiry job: {e}"),
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] order_id: {} user_id: {}", o.id, o.order_id, o.user_id))
        .collect::<Vec<String>>()
        .join(", ")
}
