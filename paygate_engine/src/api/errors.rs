use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    fulfillment::FulfilmentError,
    traits::{AccountApiError, ExchangeRateError, LedgerError, PaymentGatewayError, RailError, TransferError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("User {user_id} already has {count} open orders for product {product_id}")]
    OrderMaxCountReached { user_id: i64, product_id: i64, count: i64 },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    OrderStatusInvalid { order_id: i64, from: OrderStatusType, to: OrderStatusType },
    #[error("Order {order_id} is already {status}")]
    OrderAlreadyResolved { order_id: i64, status: OrderStatusType },
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Quantity must be between one and the per-order maximum, but was {0}")]
    InvalidQuantity(i64),
    #[error("Order {order_id} was paid, but its entitlement cannot be granted. {source}")]
    Fulfilment { order_id: i64, source: FulfilmentError },
    #[error("{0}")]
    Rail(#[from] RailError),
    #[error("{0}")]
    Transfer(#[from] TransferError),
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}

impl OrderFlowError {
    /// A stable, machine-readable code for the error, suitable for mapping to user-facing copy.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::OrderMaxCountReached { .. } => "ORDER_MAX_COUNT_REACHED",
            Self::OrderStatusInvalid { .. } => "ORDER_STATUS_INVALID",
            Self::OrderAlreadyResolved { .. } => "ORDER_ALREADY_RESOLVED",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::Rail(_) => "PAYMENT_RAIL_ERROR",
            Self::Transfer(_) => "TRANSFER_FAILED",
            Self::Fulfilment { .. } => "FULFILMENT_FAILED",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors caused by the request itself, as opposed to a failing collaborator.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_) |
                Self::OrderMaxCountReached { .. } |
                Self::OrderStatusInvalid { .. } |
                Self::OrderAlreadyResolved { .. } |
                Self::ProductNotFound(_) |
                Self::InvalidQuantity(_)
        )
    }
}

/// Reasons a whole reconciliation scan was abandoned. Failures to settle individual orders do not abort a scan.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("Could not load the orders to reconcile. {0}")]
    Database(#[from] PaymentGatewayError),
}

impl From<AccountApiError> for OrderFlowError {
    fn from(e: AccountApiError) -> Self {
        Self::Database(PaymentGatewayError::AccountError(e))
    }
}

impl From<ExchangeRateError> for OrderFlowError {
    fn from(e: ExchangeRateError) -> Self {
        Self::Rail(RailError::ExchangeRate(e))
    }
}
