use chrono::{DateTime, Utc};
use paygate_common::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{OrderStatusType, PaymentType},
    traits::ExchangeRateError,
};

#[derive(Debug, Clone, Error)]
pub enum RailError {
    #[error("No price is available for this rail. {0}")]
    QuoteUnavailable(String),
    #[error("Could not create a payment link. {0}")]
    PaymentLinkFailed(String),
    #[error("{0}")]
    ExchangeRate(#[from] ExchangeRateError),
}

/// The price of an order on a given rail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub amount: Amount,
    /// Minor units per fiat cent
    pub rate: f64,
    /// When the rate was last refreshed
    pub quoted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Amount,
    pub title: String,
    pub description: String,
    /// The key the rail must carry through to the payment (as a transfer comment or invoice payload)
    pub correlation_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub link: String,
    pub correlation_key: String,
}

/// A payment method, with its own pricing and its own way of asking the user to pay.
#[allow(async_fn_in_trait)]
pub trait PaymentRail {
    fn payment_type(&self) -> PaymentType;

    /// The status a fresh order settles in. Rails whose payment link is already a live payment attempt (an invoice)
    /// return `Processing`. Rails that need the user to start a transfer return `Pending`.
    fn initial_status(&self) -> OrderStatusType;

    /// Prices `fiat_cents` in this rail's minor units.
    async fn quote(&self, fiat_cents: i64) -> Result<Quote, RailError>;

    /// Produces the link the user follows to pay.
    async fn request_payment(&self, request: PaymentRequest) -> Result<PaymentLink, RailError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub amount: Amount,
    pub title: String,
    pub description: String,
    pub payload: String,
}

/// The platform-native checkout collaborator. Paying the invoice later triggers a pre-checkout callback carrying
/// the invoice payload.
#[allow(async_fn_in_trait)]
pub trait InvoiceClient {
    /// Returns the invoice link.
    async fn create_invoice(&self, invoice: InvoiceRequest) -> Result<String, RailError>;
}
