use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use paygate_common::Amount;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------     PaymentType       ---------------------------------------------------------
/// The payment rail an order is settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PaymentType {
    /// The chain's native token, confirmed by scanning the ledger for a transfer carrying the order's memo.
    OnChainNative,
    /// A platform-internal currency, confirmed by the platform's checkout callback.
    PlatformCredit,
    /// A 6-decimal token transfer, confirmed by ledger scanning like the native token.
    Stablecoin,
}

impl PaymentType {
    /// The number of decimal places between the display unit and the minor unit stored in [`Amount`].
    pub fn decimals(&self) -> u32 {
        match self {
            PaymentType::OnChainNative => 9,
            PaymentType::PlatformCredit => 0,
            PaymentType::Stablecoin => 6,
        }
    }

    /// Rails that are reconciled against the ledger rather than by a push callback
    pub fn is_ledger_settled(&self) -> bool {
        !matches!(self, PaymentType::PlatformCredit)
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::OnChainNative => write!(f, "OnChainNative"),
            PaymentType::PlatformCredit => write!(f, "PlatformCredit"),
            PaymentType::Stablecoin => write!(f, "Stablecoin"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OnChainNative" => Ok(Self::OnChainNative),
            "PlatformCredit" => Ok(Self::PlatformCredit),
            "Stablecoin" => Ok(Self::Stablecoin),
            s => Err(ConversionError(format!("Invalid payment type: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created, but the user has not started paying yet.
    Pending,
    /// A payment is in flight and waiting to be confirmed.
    Processing,
    /// The payment was confirmed and the entitlement has been granted.
    Success,
    /// The payment attempt failed. The order can be retried.
    Failed,
    /// The order was not paid before its expiry time.
    Expired,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Success => write!(f, "Success"),
            OrderStatusType::Failed => write!(f, "Failed"),
            OrderStatusType::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------      ProductKind      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProductKind {
    /// A pack of in-app coins
    Coins,
    /// A premium subscription measured in days
    Subscription,
    /// Coins and premium days sold together
    Bundle,
}

impl Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Coins => write!(f, "Coins"),
            ProductKind::Subscription => write!(f, "Subscription"),
            ProductKind::Bundle => write!(f, "Bundle"),
        }
    }
}

impl FromStr for ProductKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Coins" => Ok(Self::Coins),
            "Subscription" => Ok(Self::Subscription),
            "Bundle" => Ok(Self::Bundle),
            s => Err(ConversionError(format!("Invalid product kind: {s}"))),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub kind: ProductKind,
    /// Coins granted per unit purchased
    pub coins: i64,
    /// Premium days granted per unit purchased
    pub premium_days: i64,
    /// Fiat price per unit, in cents
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub kind: ProductKind,
    pub coins: i64,
    pub premium_days: i64,
    pub price_cents: i64,
}

impl NewProduct {
    pub fn coins(name: &str, coins: i64, price_cents: i64) -> Self {
        Self { name: name.to_string(), kind: ProductKind::Coins, coins, premium_days: 0, price_cents }
    }

    pub fn subscription(name: &str, premium_days: i64, price_cents: i64) -> Self {
        Self { name: name.to_string(), kind: ProductKind::Subscription, coins: 0, premium_days, price_cents }
    }

    pub fn bundle(name: &str, coins: i64, premium_days: i64, price_cents: i64) -> Self {
        Self { name: name.to_string(), kind: ProductKind::Bundle, coins, premium_days, price_cents }
    }
}

//--------------------------------------      UserAccount      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    /// The user's id on the messaging platform
    pub id: i64,
    pub coin_balance: i64,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.map(|t| t > now).unwrap_or(false)
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub payment_type: PaymentType,
    pub status: OrderStatusType,
    /// The amount due, in the rail's minor units
    pub amount: Amount,
    /// The fiat price of the order, in cents
    pub fiat_amount: i64,
    /// Minor units per fiat cent at the time the order was quoted
    pub exchange_rate: f64,
    pub rate_valid_seconds: i64,
    pub rate_quoted_at: DateTime<Utc>,
    /// The correlation key linking the order to a ledger memo or a checkout payload. Never changes once created.
    pub external_payment_id: String,
    pub payment_link: String,
    pub expire_at: DateTime<Utc>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at < now
    }

    /// True if the exchange rate this order was quoted at has outlived its validity window.
    pub fn rate_is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.rate_quoted_at > Duration::seconds(self.rate_valid_seconds)
    }

    pub fn display_amount(&self, code: &str) -> String {
        self.amount.display_with(self.payment_type.decimals(), code)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub payment_type: PaymentType,
    pub amount: Amount,
    pub fiat_amount: i64,
    pub exchange_rate: f64,
    pub rate_valid_seconds: i64,
    pub rate_quoted_at: DateTime<Utc>,
    pub external_payment_id: String,
    pub payment_link: String,
    pub expire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        LineItem       ---------------------------------------------------------
/// The purchased product on an order. Its status mirrors the order's status.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub quantity: i64,
    pub status: OrderStatusType,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: i64,
    pub quantity: i64,
}

//--------------------------------------  StatusHistoryEntry   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub from_status: OrderStatusType,
    pub to_status: OrderStatusType,
    /// JSON snapshot of the order as it was when the transition was made
    pub snapshot: String,
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn snapshot_order(&self) -> Result<Order, serde_json::Error> {
        serde_json::from_str(&self.snapshot)
    }
}

//--------------------------------------      OrderPatch       ---------------------------------------------------------
/// Extra fields that may be updated along with a status change. The correlation key is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub paid_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub payment_link: Option<String>,
}

impl OrderPatch {
    pub fn checked_at(time: DateTime<Utc>) -> Self {
        Self { last_checked_at: Some(time), ..Default::default() }
    }

    pub fn paid_at(mut self, time: DateTime<Utc>) -> Self {
        self.paid_at = Some(time);
        self
    }
}
