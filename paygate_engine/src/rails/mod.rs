//! Built-in payment rails.
//!
//! * [`InvoiceRail`] sells through the platform's own checkout. The invoice is the payment attempt, so orders start in
//!   `Processing` and are settled by the pre-checkout callback.
//! * [`TransferRail`] asks the user to make an on-chain transfer with the order's correlation key as the comment.
//!   Orders wait in `Pending` until the transfer is submitted, and are settled by ledger reconciliation.
mod invoice_rail;
mod transfer_rail;

use chrono::Utc;
use log::*;

pub use invoice_rail::InvoiceRail;
pub use transfer_rail::TransferRail;

use crate::traits::{ExchangeRates, Quote, RailError};

/// Prices `fiat_cents` with the latest stored rate for `currency`.
pub async fn quote_from_rates<X: ExchangeRates>(rates: &X, currency: &str, fiat_cents: i64) -> Result<Quote, RailError> {
    let rate = rates.fetch_last_rate(currency).await?;
    let amount = rate.convert_from_cents(fiat_cents);
    let age = Utc::now() - rate.updated_at;
    trace!("💱️ {fiat_cents}¢ is {amount} {currency} units at {rate} (rate is {}s old)", age.num_seconds());
    Ok(Quote { amount, rate: rate.units_per_cent, quoted_at: rate.updated_at })
}
