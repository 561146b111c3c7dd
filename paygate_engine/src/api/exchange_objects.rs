use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use paygate_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// The rail currency code, e.g. `TON`
    pub currency: String,
    /// How many minor units of `currency` one fiat cent buys
    pub units_per_cent: f64,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(currency: &str, units_per_cent: f64, updated_at: Option<DateTime<Utc>>) -> Self {
        let updated_at = updated_at.unwrap_or_else(Utc::now);
        Self { currency: currency.to_string(), units_per_cent, updated_at }
    }

    /// Converts a fiat amount in cents to the rail's minor units. Fractions of a unit are rounded up, so the
    /// merchant is never short-changed.
    pub fn convert_from_cents(&self, cents: i64) -> Amount {
        #[allow(clippy::cast_possible_truncation)]
        Amount::from((cents as f64 * self.units_per_cent).ceil() as i64)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, valid_seconds: i64) -> bool {
        now - self.updated_at > Duration::seconds(valid_seconds)
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1¢ => {} {} units", self.units_per_cent, self.currency)
    }
}
