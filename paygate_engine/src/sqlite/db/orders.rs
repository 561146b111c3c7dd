use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderPatch, OrderStatusType, PaymentType},
    sqlite::db::push_status_list,
    traits::{PaymentGatewayError, StatusTransition},
};

/// Keys are looked up in chunks to stay well clear of SQLite's bound parameter limit.
const KEY_CHUNK_SIZE: usize = 500;

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    order: NewOrder,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                payment_type,
                status,
                amount,
                fiat_amount,
                exchange_rate,
                rate_valid_seconds,
                rate_quoted_at,
                external_payment_id,
                payment_link,
                expire_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.payment_type)
    .bind(status)
    .bind(order.amount)
    .bind(order.fiat_amount)
    .bind(order.exchange_rate)
    .bind(order.rate_valid_seconds)
    .bind(order.rate_quoted_at)
    .bind(order.external_payment_id)
    .bind(order.payment_link)
    .bind(order.expire_at)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} inserted for user {}", order.id, order.user_id);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_id(
    payment_type: PaymentType,
    external_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_type = $1 AND external_payment_id = $2")
        .bind(payment_type)
        .bind(external_payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_by_payment_ids(
    payment_type: PaymentType,
    status: OrderStatusType,
    keys: &[String],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut result = Vec::new();
    for chunk in keys.chunks(KEY_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE payment_type = ");
        builder.push_bind(payment_type);
        builder.push(" AND status = ");
        builder.push_bind(status);
        builder.push(" AND external_payment_id IN (");
        let mut list = builder.separated(", ");
        for key in chunk {
            list.push_bind(key);
        }
        list.push_unseparated(") ORDER BY id");
        let orders: Vec<Order> = builder.build_query_as().fetch_all(&mut *conn).await?;
        result.extend(orders);
    }
    trace!("🗃️ {} of {} payment ids belong to {status} {payment_type} orders", result.len(), keys.len());
    Ok(result)
}

/// Every order that has not reached `Success` or `Expired` and whose deadline is before `now`.
pub async fn fetch_expired_candidates(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE status NOT IN ");
    push_status_list(&mut builder, &[OrderStatusType::Success, OrderStatusType::Expired]);
    builder.push(" AND expire_at < ");
    builder.push_bind(now);
    builder.push(" ORDER BY expire_at");
    builder.build_query_as().fetch_all(conn).await
}

/// Updates the order's status, guarded on the status still being `transition.from`. Returns `None` if the guard
/// failed.
///
/// On `Success`, `paid_at` is set to the patch value, or to the transition time if the patch does not have one.
pub async fn update_status(
    transition: &StatusTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let OrderPatch { paid_at, last_checked_at, payment_link } = transition.patch.clone();
    let paid_at = match transition.to {
        OrderStatusType::Success => paid_at.or(Some(transition.at)),
        _ => paid_at,
    };
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                paid_at = COALESCE($2, paid_at),
                last_checked_at = COALESCE($3, last_checked_at),
                payment_link = COALESCE($4, payment_link),
                updated_at = $5
            WHERE id = $6 AND status = $7
            RETURNING *;
        "#,
    )
    .bind(transition.to)
    .bind(paid_at)
    .bind(last_checked_at)
    .bind(payment_link)
    .bind(transition.at)
    .bind(transition.order_id)
    .bind(transition.from)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at").bind(user_id).fetch_all(conn).await
}

