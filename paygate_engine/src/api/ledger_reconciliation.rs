//! Matches incoming ledger transfers to `Processing` orders.
//!
//! Transfers are fetched page by page, grouped by their memo, and each memo is looked up as an order correlation key
//! on the reconciled rail. An order whose transfer carries exactly the amount due is completed. Any other amount fails
//! the order: a partial or excess payment is never accepted.
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::{errors::ReconciliationError, order_flow_api::OrderFlowApi},
    db_types::{Order, OrderPatch, OrderStatusType, PaymentType},
    order_objects::ReconciliationResult,
    traits::{LedgerClient, LedgerError, LedgerTransaction, Notifier, OrderManagement},
};

pub const LEDGER_RECONCILIATION_JOB: &str = "job:ledger-reconciliation";

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// The rail whose orders are settled by the scanned ledger
    pub payment_type: PaymentType,
    /// The service's receiving addresses on the ledger
    pub addresses: Vec<String>,
    pub page_size: usize,
    /// The currency code used in user notifications
    pub currency_code: String,
}

impl ReconciliationConfig {
    pub fn new(payment_type: PaymentType, addresses: Vec<String>, currency_code: &str) -> Self {
        Self { payment_type, addresses, page_size: 1000, currency_code: currency_code.to_string() }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

pub struct LedgerReconciler<B, L, N> {
    api: OrderFlowApi<B>,
    ledger: L,
    notifier: N,
    config: ReconciliationConfig,
}

impl<B, L, N> LedgerReconciler<B, L, N>
where
    B: OrderManagement,
    L: LedgerClient,
    N: Notifier,
{
    pub fn new(api: OrderFlowApi<B>, ledger: L, notifier: N, config: ReconciliationConfig) -> Self {
        Self { api, ledger, notifier, config }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Scans every transfer since `since` and settles the orders they pay for.
    ///
    /// Only one scan runs at a time; a scan that starts while another is in progress waits for it to finish.
    pub async fn reconcile_since(&self, since: DateTime<Utc>) -> Result<ReconciliationResult, ReconciliationError> {
        let job_ttl = self.api.config().job_lock_ttl;
        self.api.locks().with_lock(LEDGER_RECONCILIATION_JOB, job_ttl, self.reconcile_inner(since)).await
    }

    async fn reconcile_inner(&self, since: DateTime<Utc>) -> Result<ReconciliationResult, ReconciliationError> {
        let transactions = self.fetch_transactions_since(since.timestamp()).await?;
        let mut result = ReconciliationResult { fetched: transactions.len(), ..Default::default() };
        let by_memo = group_by_memo(transactions);
        result.with_memo = by_memo.values().map(Vec::len).sum();
        if by_memo.is_empty() {
            trace!("🧾️ No memo-bearing transfers since {since}");
            return Ok(result);
        }
        let keys = by_memo.keys().cloned().collect::<Vec<String>>();
        let orders = self
            .api
            .db()
            .fetch_orders_by_payment_ids(self.config.payment_type, OrderStatusType::Processing, &keys)
            .await?;
        debug!("🧾️ {} transfers with a memo matched {} processing orders", result.with_memo, orders.len());
        let now = Utc::now();
        for order in orders {
            let Some(transfers) = by_memo.get(&order.external_payment_id) else {
                continue;
            };
            let paid = transfers.iter().any(|tx| tx.amount == order.amount);
            let (to, patch) = if paid {
                (OrderStatusType::Success, OrderPatch::checked_at(now).paid_at(now))
            } else {
                let seen = transfers.iter().map(|tx| tx.amount.to_string()).collect::<Vec<_>>().join(", ");
                warn!(
                    "🧾️ Order {} expected exactly {} but received [{seen}]. Marking it as failed.",
                    order.id, order.amount
                );
                (OrderStatusType::Failed, OrderPatch::checked_at(now))
            };
            match self.api.update_status(order.id, to, Some(patch)).await {
                Ok(updated) if paid => {
                    self.notify_paid(&updated).await;
                    result.succeeded.push(updated);
                },
                Ok(updated) => result.failed.push(updated),
                Err(e) => {
                    error!("🧾️ Could not settle order {}. {e}", order.id);
                    result.errors += 1;
                },
            }
        }
        info!(
            "🧾️ Reconciliation: {} transfers, {} completed, {} failed, {} errors",
            result.fetched,
            result.succeeded.len(),
            result.failed.len(),
            result.errors
        );
        Ok(result)
    }

    /// Fetches transfers page by page until the ledger returns a short page of records.
    ///
    /// With several addresses a page may hold up to `page_size` transfers per address, so the offset advances by
    /// `page_size` rather than by the number of transfers returned.
    pub async fn fetch_transactions_since(&self, since: i64) -> Result<Vec<LedgerTransaction>, LedgerError> {
        let page_size = self.config.page_size.max(1);
        let mut offset = 0;
        let mut all = Vec::new();
        loop {
            let page = self.ledger.list_transactions(&self.config.addresses, since, offset, page_size).await?;
            trace!("🧾️ Fetched {} transfers from {} records at offset {offset}", page.transactions.len(), page.records);
            all.extend(page.transactions);
            if page.records < page_size {
                break;
            }
            offset += page_size;
        }
        Ok(all)
    }

    async fn notify_paid(&self, order: &Order) {
        let text = format!(
            "Payment received! Order #{} for {} is complete.",
            order.id,
            order.display_amount(&self.config.currency_code)
        );
        if let Err(e) = self.notifier.notify(order.user_id, &text).await {
            warn!("🧾️ {e}");
        }
    }
}

/// Drops transfers without a memo and groups the rest by memo, keeping ledger order within each group.
pub fn group_by_memo(transactions: Vec<LedgerTransaction>) -> BTreeMap<String, Vec<LedgerTransaction>> {
    let mut groups: HashMap<String, Vec<LedgerTransaction>> = HashMap::new();
    for tx in transactions {
        let memo = match tx.comment.as_deref() {
            Some(memo) if !memo.is_empty() => memo.to_string(),
            _ => {
                trace!("🧾️ Transfer {} has no memo. Skipping it.", tx.id);
                continue;
            },
        };
        groups.entry(memo).or_default().push(tx);
    }
    groups.into_iter().collect()
}
