use thiserror::Error;

use crate::db_types::{LineItem, NewProduct, Order, Product, StatusHistoryEntry, UserAccount};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Read access to users, products and orders, plus the two bookkeeping writes (user creation and the product
/// catalogue) that do not go through the order flow.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the user with the given platform id. If no account exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    /// Fetches the user with the given platform id, creating an empty account first if necessary.
    async fn fetch_or_create_user(&self, user_id: i64) -> Result<UserAccount, AccountApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, AccountApiError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, AccountApiError>;

    /// Adds a product to the catalogue. If a product with the same name exists, it is updated in place.
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, AccountApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AccountApiError>;

    async fn fetch_line_item(&self, order_id: i64) -> Result<Option<LineItem>, AccountApiError>;

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError>;

    /// The full status history of an order, oldest first.
    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, AccountApiError>;
}
