use chrono::{DateTime, Utc};
use log::*;
use paygate_engine::{
    traits::{LedgerClient, Notifier, OrderManagement},
    LedgerReconciler,
    SqliteDatabase,
};
use rail_clients::{BotApi, LedgerApi};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::config::JobConfig;

pub type ServerReconciler = LedgerReconciler<SqliteDatabase, LedgerApi, BotApi>;

/// Starts the ledger reconciliation worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Unless startup jobs are disabled, the worker first scans the whole backfill window to pick up payments that arrived
/// while the server was down. After that, each tick scans the (much shorter) reconciliation window.
pub fn start_ledger_worker(reconcilers: Vec<ServerReconciler>, jobs: JobConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if jobs.skip_startup_jobs {
            info!("🧾️ Skipping the ledger backfill");
        } else {
            let since = Utc::now() - jobs.ledger_backfill;
            info!("🧾️ Backfilling ledger payments since {since}");
            run_reconciliation(&reconcilers, since).await;
        }
        let mut timer = tokio::time::interval(jobs.ledger_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer.tick().await;
        info!("🧾️ Ledger reconciliation worker started");
        loop {
            timer.tick().await;
            run_reconciliation(&reconcilers, Utc::now() - jobs.ledger_window).await;
        }
    })
}

/// Runs each reconciler in turn. A failing rail does not stop the others. Returns the number of orders completed.
pub async fn run_reconciliation<B, L, N>(reconcilers: &[LedgerReconciler<B, L, N>], since: DateTime<Utc>) -> usize
where
    B: OrderManagement,
    L: LedgerClient,
    N: Notifier,
{
    let mut completed = 0;
    for reconciler in reconcilers {
        let rail = reconciler.config().payment_type;
        match reconciler.reconcile_since(since).await {
            Ok(result) => {
                debug!("🧾️ {rail}: {} transfers scanned, {} orders completed", result.fetched, result.succeeded.len());
                completed += result.succeeded.len();
            },
            Err(e) => error!("🧾️ {rail} reconciliation failed. {e}"),
        }
    }
    completed
}
