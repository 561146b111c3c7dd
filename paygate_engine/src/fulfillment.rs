//! Entitlement policy.
//!
//! Works out what a paid line item grants the buyer. The result is applied by the storage backend in the same
//! transaction that moves the order to `Success`.
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Product, ProductKind, UserAccount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfilmentError {
    #[error("{quantity} × product {product_id} grants more than an account can hold")]
    GrantTooLarge { product_id: i64, quantity: i64 },
    #[error("Extending premium by {0} days goes past the end of the calendar")]
    PremiumOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementGrant {
    pub user_id: i64,
    pub coins: i64,
    /// The new premium expiry, if the product carries premium days
    pub premium_until: Option<DateTime<Utc>>,
}

/// Computes the grant for `quantity` units of `product` bought by `account`.
pub fn grant_for(
    product: &Product,
    quantity: i64,
    account: &UserAccount,
    now: DateTime<Utc>,
) -> Result<EntitlementGrant, FulfilmentError> {
    let too_large = || FulfilmentError::GrantTooLarge { product_id: product.id, quantity };
    let coins = match product.kind {
        ProductKind::Coins | ProductKind::Bundle => product.coins.checked_mul(quantity).ok_or_else(too_large)?,
        ProductKind::Subscription => 0,
    };
    let days = match product.kind {
        ProductKind::Subscription | ProductKind::Bundle => {
            product.premium_days.checked_mul(quantity).ok_or_else(too_large)?
        },
        ProductKind::Coins => 0,
    };
    account.coin_balance.checked_add(coins).ok_or_else(too_large)?;
    let premium_until = if days > 0 { Some(extend_premium(account.premium_until, days, now)?) } else { None };
    Ok(EntitlementGrant { user_id: account.id, coins, premium_until })
}

/// Extends a premium window by `days`.
///
/// An active window is extended from its current expiry, otherwise the new window starts now. Either way the result
/// is rounded up to the last second of the day, UTC.
pub fn extend_premium(
    current: Option<DateTime<Utc>>,
    days: i64,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, FulfilmentError> {
    let anchor = match current {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };
    Duration::try_days(days)
        .and_then(|d| anchor.checked_add_signed(d))
        .map(end_of_day)
        .ok_or(FulfilmentError::PremiumOutOfRange(days))
}

pub fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    Utc.from_utc_datetime(&t.date_naive().and_time(last_second))
}
