use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Product};

/// Published exactly once for every order that reaches `Success`, after the transition has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEvent {
    pub order: Order,
    pub product: Product,
}

impl SuccessEvent {
    pub fn new(order: Order, product: Product) -> Self {
        Self { order, product }
    }
}
