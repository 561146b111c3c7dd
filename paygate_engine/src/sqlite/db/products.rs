use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products ORDER BY id").fetch_all(conn).await
}

/// Inserts the product, or updates the product with the same name.
pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO products (name, kind, coins, premium_days, price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE SET
                kind = excluded.kind,
                coins = excluded.coins,
                premium_days = excluded.premium_days,
                price_cents = excluded.price_cents
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.kind)
    .bind(product.coins)
    .bind(product.premium_days)
    .bind(product.price_cents)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}
