//! # Payment gateway server
//! This crate hosts the server binary for the payment gateway. It is responsible for:
//! * Taking orders from the conversational front-end and handing out payment links.
//! * Answering the chat platform's pre-checkout callbacks for platform-credit invoices.
//! * Running the periodic jobs: ledger reconciliation for on-chain payments, and the expiry sweep.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/products`: The product catalogue.
//! * `/orders`: Creates an order. `/orders/{id}` fetches one, and `/orders/{id}/history` its status changes.
//! * `/orders/{id}/submitted`: The user says they have sent the on-chain transfer for an order.
//! * `/webhook/precheckout`: The bot webhook for pre-checkout callbacks.
//! * `/admin/products` and `/admin/rates`: Catalogue and exchange rate maintenance. Requires the admin token.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod ledger_worker;
pub mod payment_rails;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
