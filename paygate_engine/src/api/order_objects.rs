use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// The answer to a platform pre-checkout callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutAnswer {
    Accept { order_id: i64 },
    Reject { reason: String },
}

impl CheckoutAnswer {
    pub fn reject<S: Into<String>>(reason: S) -> Self {
        Self::Reject { reason: reason.into() }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpiryResult {
    pub expired: Vec<Order>,
    /// Orders that could not be expired, with the reason
    pub skipped: Vec<(i64, String)>,
}

impl ExpiryResult {
    pub fn count(&self) -> usize {
        self.expired.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Every transaction the ledger returned
    pub fetched: usize,
    /// Transactions that carried a memo
    pub with_memo: usize,
    pub succeeded: Vec<Order>,
    pub failed: Vec<Order>,
    /// Matched orders whose update did not go through
    pub errors: usize,
}
