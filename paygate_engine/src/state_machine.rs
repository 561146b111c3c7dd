//! The order status state machine.
//!
//! ```text
//!   PENDING ──► PROCESSING ──► SUCCESS
//!                 │     ▲
//!                 ▼     │
//!                 FAILED
//!
//!   PENDING, PROCESSING, FAILED ──► EXPIRED
//! ```
//!
//! SUCCESS and EXPIRED are terminal. FAILED is not: the same order may be retried by re-submitting a payment, which
//! moves it back into PROCESSING.
use crate::db_types::OrderStatusType::{self, *};

/// The statuses reachable from `from` in a single step.
pub fn allowed_transitions(from: OrderStatusType) -> &'static [OrderStatusType] {
    match from {
        Pending => &[Processing, Expired],
        Processing => &[Success, Failed, Expired],
        Failed => &[Processing, Expired],
        Success | Expired => &[],
    }
}

pub fn can_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Orders in these states still count against a user's open order limit.
pub fn not_ended_statuses() -> [OrderStatusType; 2] {
    [Pending, Processing]
}

/// Terminal statuses. Any further status update on an order in one of these states is refused.
pub fn is_terminal(status: OrderStatusType) -> bool {
    matches!(status, Success | Expired)
}

/// Orders in these states can no longer be paid through a checkout callback.
///
/// This is wider than [`is_terminal`]: a FAILED order may be retried, but not by confirming a stale checkout.
pub fn is_closed_for_checkout(status: OrderStatusType) -> bool {
    matches!(status, Success | Expired | Failed)
}

impl OrderStatusType {
    pub fn can_transition_to(&self, to: OrderStatusType) -> bool {
        can_transition(*self, to)
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal(*self)
    }
}
