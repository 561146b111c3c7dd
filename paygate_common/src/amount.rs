use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A quantity in the smallest indivisible unit of a payment rail (nano-tokens for an on-chain native token, micro-units
/// for a 6-decimal stablecoin, whole credits for a platform currency).
///
/// Amounts are compared for exact equality when matching a ledger transfer to an order, so they are kept as integers.
/// The number of decimals is a property of the rail, not of the amount.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Mul<i64> for Amount {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Amount {
    type Error = AmountConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(AmountConversionError(format!("Value {value} is too large to convert to an Amount")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl TryFrom<&str> for Amount {
    type Error = AmountConversionError;

    /// Ledger APIs usually serialise amounts as decimal strings of minor units, e.g. `"1500000000"`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| AmountConversionError(format!("'{value}' is not an integer amount. {e}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Amount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts a human-readable quantity (e.g. `10.5` tokens) into minor units, rounding to the nearest unit.
    pub fn from_major(value: f64, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        #[allow(clippy::cast_possible_truncation)]
        Self((value * scale).round() as i64)
    }

    /// Converts this amount back to the rail's display unit.
    pub fn to_major(&self, decimals: u32) -> f64 {
        let scale = 10f64.powi(decimals as i32);
        self.0 as f64 / scale
    }

    /// Formats the amount in display units with the rail's currency code, e.g. `"10.500000000 TON"`.
    pub fn display_with(&self, decimals: u32, code: &str) -> String {
        format!("{:.*} {code}", decimals as usize, self.to_major(decimals))
    }
}
