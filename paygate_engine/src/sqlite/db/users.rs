use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::UserAccount, fulfillment::EntitlementGrant};

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn fetch_or_create_user(user_id: i64, conn: &mut SqliteConnection) -> Result<UserAccount, sqlx::Error> {
    let now = Utc::now();
    let inserted = sqlx::query(
        "INSERT INTO users (id, coin_balance, created_at, updated_at) VALUES ($1, 0, $2, $2) ON CONFLICT (id) DO NOTHING",
    )
    .bind(user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if inserted.rows_affected() > 0 {
        trace!("🗃️ Created account for user {user_id}");
    }
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_one(conn).await
}

/// Credits the grant's coins and, if present, sets the new premium expiry.
pub async fn apply_grant(
    grant: &EntitlementGrant,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE users SET
                coin_balance = coin_balance + $1,
                premium_until = COALESCE($2, premium_until),
                updated_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(grant.coins)
    .bind(grant.premium_until)
    .bind(at)
    .bind(grant.user_id)
    .fetch_one(conn)
    .await
}
