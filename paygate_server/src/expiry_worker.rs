use std::time::Duration;

use log::*;
use paygate_engine::{db_types::Order, traits::OrderManagement, OrderFlowApi, SqliteDatabase};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// With `run_at_start`, the first sweep runs straight away rather than after one `interval`.
pub fn start_expiry_worker(
    api: OrderFlowApi<SqliteDatabase>,
    interval: Duration,
    run_at_start: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !run_at_start {
            // The first tick completes immediately
            timer.tick().await;
        }
        info!("🕰️ Order expiry worker started");
        loop {
            timer.tick().await;
            run_expiry_job(&api).await;
        }
    })
}

/// Runs one expiry sweep and logs the outcome. Returns the number of orders expired.
pub async fn run_expiry_job<B: OrderManagement>(api: &OrderFlowApi<B>) -> usize {
    debug!("🕰️ Running order expiry job");
    match api.run_expiry_sweep().await {
        Ok(result) => {
            info!("🕰️ {} orders expired", result.count());
            if !result.expired.is_empty() {
                debug!("🕰️ Expired orders: {}", order_list(&result.expired));
            }
            for (order_id, reason) in &result.skipped {
                warn!("🕰️ Order {order_id} was left as is. {reason}");
            }
            result.count()
        },
        Err(e) => {
            error!("🕰️ Error running order expiry job: {e}");
            0
        },
    }
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] user {} on {}", o.id, o.user_id, o.payment_type))
        .collect::<Vec<String>>()
        .join(", ")
}
