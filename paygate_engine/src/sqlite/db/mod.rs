//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut *tx` when several calls must succeed or fail together.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

use crate::db_types::OrderStatusType;

pub mod exchange_rates;
pub mod line_items;
pub mod orders;
pub mod products;
pub mod status_history;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/paygate.db";

pub fn db_url() -> String {
    let result = env::var("PG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Appends `(?, ?, …)` with one bound parameter per status.
pub(crate) fn push_status_list(builder: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, statuses: &[OrderStatusType]) {
    builder.push("(");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(status.to_string());
    }
    list.push_unseparated(")");
}
