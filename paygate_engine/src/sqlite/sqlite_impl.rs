//! `SqliteDatabase` is a concrete implementation of a payment gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{db_url, exchange_rates, line_items, new_pool, orders, products, status_history, users};
use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
        NewProduct,
        Order,
        OrderStatusType,
        PaymentType,
        Product,
        StatusHistoryEntry,
        UserAccount,
    },
    exchange_objects::ExchangeRate,
    fulfillment::grant_for,
    traits::{
        AccountApiError,
        AccountManagement,
        ExchangeRateError,
        ExchangeRates,
        Fulfilment,
        OrderManagement,
        PaymentGatewayError,
        StatusTransition,
        TransitionOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, item: NewLineItem) -> Result<(Order, LineItem), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let status = OrderStatusType::Pending;
        let created_at = order.created_at;
        let order = orders::insert_order(order, status, &mut tx).await?;
        let line_item = line_items::insert_line_item(order.id, order.user_id, item, status, created_at, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order #{} and line item #{} committed", order.id, line_item.id);
        Ok((order, line_item))
    }

    async fn count_open_line_items(&self, user_id: i64, product_id: i64) -> Result<i64, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let count = line_items::count_open_line_items(user_id, product_id, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_order_by_payment_id(
        &self,
        payment_type: PaymentType,
        external_payment_id: &str,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_id(payment_type, external_payment_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_by_payment_ids(
        &self,
        payment_type: PaymentType,
        status: OrderStatusType,
        keys: &[String],
    ) -> Result<Vec<Order>, PaymentGatewayError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_by_payment_ids(payment_type, status, keys, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_expired_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_expired_candidates(now, &mut conn).await?;
        Ok(orders)
    }

    async fn transition_order(&self, transition: StatusTransition) -> Result<TransitionOutcome, PaymentGatewayError> {
        let order_id = transition.order_id;
        let mut tx = self.pool.begin().await?;
        let before =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        status_history::append_entry(&before, transition.to, transition.at, &mut tx).await?;
        let order = orders::update_status(&transition, &mut tx).await?.ok_or(PaymentGatewayError::StatusChanged {
            order_id,
            expected: transition.from,
            actual: before.status,
        })?;
        let line_item = line_items::mirror_status(order_id, transition.to, transition.at, &mut tx)
            .await?
            .ok_or(PaymentGatewayError::LineItemNotFound(order_id))?;
        let fulfilment = if transition.to == OrderStatusType::Success {
            let product = products::fetch_product(line_item.product_id, &mut tx)
                .await?
                .ok_or(PaymentGatewayError::ProductNotFound(line_item.product_id))?;
            let account = users::fetch_or_create_user(line_item.user_id, &mut tx).await?;
            let grant = grant_for(&product, line_item.quantity, &account, transition.at)?;
            users::apply_grant(&grant, transition.at, &mut tx).await?;
            Some(Fulfilment { product, grant })
        } else {
            None
        };
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} {} -> {} committed", transition.from, transition.to);
        Ok(TransitionOutcome { order, line_item, fulfilment })
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_or_create_user(&self, user_id: i64) -> Result<UserAccount, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_or_create_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }

    async fn upsert_product(&self, product: NewProduct) -> Result<Product, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::upsert_product(product, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) saved", product.id, product.name);
        Ok(product)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_item(&self, order_id: i64) -> Result<Option<LineItem>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = line_items::fetch_line_item(order_id, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<StatusHistoryEntry>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let history = status_history::fetch_history(order_id, &mut conn).await?;
        Ok(history)
    }
}

impl ExchangeRates for SqliteDatabase {
    async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError> {
        let mut conn = self.pool.acquire().await?;
        exchange_rates::fetch_last_rate(currency, &mut conn).await
    }

    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError> {
        let mut conn = self.pool.acquire().await?;
        exchange_rates::set_exchange_rate(rate, &mut conn).await?;
        debug!("🗃️ Exchange rate saved: {rate}");
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
