use paygate_common::Amount;

use crate::ClientError;

/// Indexers report amounts as decimal strings of minor units, since they can exceed what a JSON number holds exactly.
pub fn parse_amount(value: &str) -> Result<Amount, ClientError> {
    let units = value.trim().parse::<i64>().map_err(|e| ClientError::InvalidAmount(format!("{value}. {e}")))?;
    if units < 0 {
        return Err(ClientError::InvalidAmount(format!("{value} is negative")));
    }
    Ok(Amount::from(units))
}
