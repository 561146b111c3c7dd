use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{LineItem, Order, OrderPatch, OrderStatusType, Product},
    fulfillment::EntitlementGrant,
};

/// A validated status change, handed to the backend for persisting.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTransition {
    pub order_id: i64,
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub patch: OrderPatch,
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    pub fn new(order_id: i64, from: OrderStatusType, to: OrderStatusType, patch: OrderPatch, at: DateTime<Utc>) -> Self {
        Self { order_id, from, to, patch, at }
    }
}

/// What the buyer received when an order reached `Success`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfilment {
    pub product: Product,
    pub grant: EntitlementGrant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub order: Order,
    pub line_item: LineItem,
    /// Only set on the `Success` branch
    pub fulfilment: Option<Fulfilment>,
}
