use paygate_common::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("The ledger could not be reached. {0}")]
    Unavailable(String),
    #[error("The ledger returned an unexpected response. {0}")]
    InvalidResponse(String),
}

/// An incoming transfer as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub amount: Amount,
    /// The transfer memo. Transfers without one cannot be matched to an order.
    pub comment: Option<String>,
    /// Unix time of the block the transfer was included in
    pub block_time: i64,
}

/// One page of ledger records.
///
/// `records` counts every record the ledger returned for the page, including outgoing, aborted or unreadable ones
/// that did not make it into `transactions`. Paging decisions are made on `records`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerPage {
    pub transactions: Vec<LedgerTransaction>,
    pub records: usize,
}

impl LedgerPage {
    /// A page where every record was an incoming transfer.
    pub fn new(transactions: Vec<LedgerTransaction>) -> Self {
        let records = transactions.len();
        Self { transactions, records }
    }

    pub fn with_records(transactions: Vec<LedgerTransaction>, records: usize) -> Self {
        Self { transactions, records }
    }

    /// Appends another page, e.g. the same offset for a different address.
    pub fn extend(&mut self, other: LedgerPage) {
        self.transactions.extend(other.transactions);
        self.records += other.records;
    }
}

#[allow(async_fn_in_trait)]
pub trait LedgerClient {
    /// Lists transfers to any of `addresses` since `since` (unix seconds), oldest first, skipping the first `offset`
    /// records.
    ///
    /// At most `limit` records are read per address. Fewer than `limit` records means there are no more.
    async fn list_transactions(
        &self,
        addresses: &[String],
        since: i64,
        offset: usize,
        limit: usize,
    ) -> Result<LedgerPage, LedgerError>;
}
