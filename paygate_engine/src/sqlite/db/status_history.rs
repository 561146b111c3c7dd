use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderStatusType, StatusHistoryEntry},
    traits::PaymentGatewayError,
};

/// Appends a history entry recording `order` (as it is before the change) moving to `to`.
pub async fn append_entry(
    order: &Order,
    to: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<StatusHistoryEntry, PaymentGatewayError> {
    let snapshot = serde_json::to_string(order).map_err(|e| PaymentGatewayError::SnapshotError(e.to_string()))?;
    let entry = sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, from_status, to_status, snapshot, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.status)
    .bind(to)
    .bind(snapshot)
    .bind(at)
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn fetch_history(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}
