//! Clients for the services the payment gateway talks to.
//!
//! * [`LedgerApi`] lists incoming transfers from a blockchain indexer, for ledger reconciliation.
//! * [`BotApi`] talks to the chat platform: it issues invoice links for platform-credit payments and sends users short
//!   notifications.
mod bot_api;
mod config;
mod error;
mod helpers;
mod ledger_api;

pub mod data_objects;

pub use bot_api::BotApi;
pub use config::{BotApiConfig, LedgerApiConfig};
pub use error::ClientError;
pub use helpers::parse_amount;
pub use ledger_api::{LedgerApi, LedgerSource};
