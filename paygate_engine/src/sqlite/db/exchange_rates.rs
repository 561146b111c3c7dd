use sqlx::SqliteConnection;

use crate::{exchange_objects::ExchangeRate, traits::ExchangeRateError};

pub async fn fetch_last_rate(currency: &str, conn: &mut SqliteConnection) -> Result<ExchangeRate, ExchangeRateError> {
    let result = sqlx::query_as(
        r#"SELECT currency, units_per_cent, updated_at FROM exchange_rates
           WHERE currency = $1 ORDER BY updated_at DESC, id DESC LIMIT 1"#,
    )
    .bind(currency)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ExchangeRateError::RateDoesNotExist(currency.to_string()))?;
    Ok(result)
}

pub async fn set_exchange_rate(rate: &ExchangeRate, conn: &mut SqliteConnection) -> Result<(), ExchangeRateError> {
    sqlx::query("INSERT INTO exchange_rates (currency, units_per_cent, updated_at) VALUES ($1, $2, $3)")
        .bind(&rate.currency)
        .bind(rate.units_per_cent)
        .bind(rate.updated_at)
        .execute(conn)
        .await?;
    Ok(())
}
