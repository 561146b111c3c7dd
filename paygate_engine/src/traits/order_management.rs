use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{LineItem, NewLineItem, NewOrder, Order, OrderStatusType, PaymentType},
    fulfillment::FulfilmentError,
    traits::{
        data_objects::{StatusTransition, TransitionOutcome},
        AccountApiError,
        AccountManagement,
    },
};

/// The storage contract the order flow runs on.
///
/// Every mutating method is a single atomic unit in the backend. Serialisation of concurrent writers to the same order
/// is *not* the backend's job; the order flow holds a per-order lock around every call to [`transition_order`].
///
/// [`transition_order`]: OrderManagement::transition_order
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone + AccountManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order and its line item in one transaction. The line item takes the order's status.
    ///
    /// Fails with [`PaymentGatewayError::DuplicatePaymentId`] if the rail already has an order with the same
    /// correlation key.
    async fn insert_order(&self, order: NewOrder, item: NewLineItem) -> Result<(Order, LineItem), PaymentGatewayError>;

    /// The number of line items for `product_id` that belong to `user_id` and are not yet ended
    /// (see [`crate::state_machine::not_ended_statuses`]).
    async fn count_open_line_items(&self, user_id: i64, product_id: i64) -> Result<i64, PaymentGatewayError>;

    /// Looks an order up by its rail and correlation key.
    async fn fetch_order_by_payment_id(
        &self,
        payment_type: PaymentType,
        external_payment_id: &str,
    ) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches the orders on `payment_type` in `status` whose correlation key is one of `keys`.
    async fn fetch_orders_by_payment_ids(
        &self,
        payment_type: PaymentType,
        status: OrderStatusType,
        keys: &[String],
    ) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Every order that is neither `Success` nor `Expired` and whose `expire_at` is before `now`.
    async fn fetch_expired_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Applies a status change in one transaction:
    /// * appends a status history entry with a snapshot of the order,
    /// * updates the order, guarded on its status still being `transition.from`,
    /// * mirrors the new status onto the line item,
    /// * on `Success`, grants the line item's entitlement to the user.
    ///
    /// If any step fails, nothing is written.
    async fn transition_order(&self, transition: StatusTransition) -> Result<TransitionOutcome, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} has no line item")]
    LineItemNotFound(i64),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order {order_id} was expected to be {expected}, but it is now {actual}")]
    StatusChanged { order_id: i64, expected: OrderStatusType, actual: OrderStatusType },
    #[error("An order with payment id {0} already exists on this rail")]
    DuplicatePaymentId(String),
    #[error("Could not serialize the order snapshot. {0}")]
    SnapshotError(String),
    #[error("The entitlement cannot be granted. {0}")]
    Fulfilment(#[from] FulfilmentError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PaymentGatewayError::DuplicatePaymentId(db.message().to_string())
            },
            _ => PaymentGatewayError::DatabaseError(e.to_string()),
        }
    }
}
