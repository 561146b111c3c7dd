use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{LineItem, NewLineItem, OrderStatusType},
    sqlite::db::push_status_list,
    state_machine::not_ended_statuses,
};

pub async fn insert_line_item(
    order_id: i64,
    user_id: i64,
    item: NewLineItem,
    status: OrderStatusType,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<LineItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO line_items (order_id, product_id, user_id, quantity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(user_id)
    .bind(item.quantity)
    .bind(status)
    .bind(created_at)
    .fetch_one(conn)
    .await
}

pub async fn fetch_line_item(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<LineItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM line_items WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Keeps the line item's status in step with its order. `completed_at` is only set on `Success`.
pub async fn mirror_status(
    order_id: i64,
    status: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<LineItem>, sqlx::Error> {
    let completed_at = (status == OrderStatusType::Success).then_some(at);
    sqlx::query_as(
        r#"
            UPDATE line_items SET
                status = $1,
                completed_at = COALESCE($2, completed_at),
                updated_at = $3
            WHERE order_id = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(completed_at)
    .bind(at)
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

pub async fn count_open_line_items(
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM line_items WHERE user_id = ");
    builder.push_bind(user_id);
    builder.push(" AND product_id = ");
    builder.push_bind(product_id);
    builder.push(" AND status IN ");
    push_status_list(&mut builder, &not_ended_statuses());
    let count: i64 = builder.build_query_scalar().fetch_one(conn).await?;
    Ok(count)
}
