pub mod errors;
pub mod exchange_objects;
pub mod ledger_reconciliation;
pub mod order_flow_api;
pub mod order_objects;
