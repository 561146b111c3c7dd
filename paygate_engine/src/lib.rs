//! Payment Gateway Engine
//!
//! The order lifecycle and payment reconciliation core of the payment gateway. It turns payment events that have
//! already happened elsewhere (a transfer on a ledger, a platform checkout callback) into order status transitions,
//! grants the purchased entitlement, and tells interested parties about it.
//!
//! The library is divided into these sections:
//! 1. The order flow API ([`OrderFlowApi`]). Every status change of an order goes through
//!    [`OrderFlowApi::update_status`], which serialises changes per order with a [`KeyedLock`], validates them against
//!    the [`state_machine`], persists them atomically and publishes a [`events::SuccessEvent`] when an order is paid.
//! 2. Reconciliation. [`LedgerReconciler`] matches ledger transfers to orders, and [`OrderFlowApi::expire_orders`]
//!    expires orders that were never paid. Both are idempotent and safe to run repeatedly.
//! 3. Backend and collaborator contracts ([`mod@traits`]), with the SQLite backend ([`SqliteDatabase`]) and the
//!    built-in payment [`rails`].
mod api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod fulfillment;
pub mod helpers;
pub mod keyed_lock;
pub mod rails;
pub mod state_machine;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    errors::{OrderFlowError, ReconciliationError},
    exchange_objects,
    ledger_reconciliation::{group_by_memo, LedgerReconciler, ReconciliationConfig, LEDGER_RECONCILIATION_JOB},
    order_flow_api::{OrderFlowApi, OrderFlowConfig, EXPIRY_SWEEP_JOB},
    order_objects,
};
pub use keyed_lock::{KeyedLock, KeyedLockGuard};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
