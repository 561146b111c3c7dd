use std::fmt::Display;

use paygate_engine::db_types::PaymentType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub user_id: i64,
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRateRequest {
    pub currency: String,
    /// Minor units of `currency` per fiat cent
    pub units_per_cent: f64,
}
