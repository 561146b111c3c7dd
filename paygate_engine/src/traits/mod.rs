//! # Backend and collaborator contracts.
//!
//! The order flow is written against traits, so that storage and the outside world can be swapped for fakes in tests.
//!
//! ## Storage
//! * [`OrderManagement`] stores orders and applies status transitions atomically.
//! * [`AccountManagement`] provides queries for users, products, orders and their history, and manages the product
//!   catalogue.
//! * [`ExchangeRates`] stores the latest rate for every rail currency.
//!
//! ## Collaborators
//! * [`PaymentRail`] prices orders and produces payment links. [`InvoiceClient`] is the platform checkout behind the
//!   invoice rail.
//! * [`LedgerClient`] lists incoming transfers for reconciliation.
//! * [`WalletClient`] sends on-chain transfers on behalf of a user session.
//! * [`Notifier`] tells a user their order went through.
mod account_management;
mod data_objects;
mod exchange_rates;
mod ledger_client;
mod notifier;
mod order_management;
mod payment_rail;
mod wallet_client;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::{Fulfilment, StatusTransition, TransitionOutcome};
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use ledger_client::{LedgerClient, LedgerError, LedgerPage, LedgerTransaction};
pub use notifier::{Notifier, NotifyError};
pub use order_management::{OrderManagement, PaymentGatewayError};
pub use payment_rail::{InvoiceClient, InvoiceRequest, PaymentLink, PaymentRail, PaymentRequest, Quote, RailError};
pub use wallet_client::{Transfer, TransferError, Wallet, WalletClient};
