//! # Correlation keys
//!
//! Every order carries a random key that travels with its payment: as the comment of an on-chain transfer, or as the
//! payload of a platform invoice. The key is what ties an incoming payment back to exactly one order.
//!
//! Keys are alphanumeric so that they survive being embedded in URLs and transfer comments without escaping.
use rand::{distributions::Alphanumeric, Rng};

pub const CORRELATION_KEY_LENGTH: usize = 16;

pub fn new_correlation_key() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(CORRELATION_KEY_LENGTH).map(char::from).collect()
}

/// A memo can only ever match an order if it has the shape of a key we issued.
pub fn is_correlation_key(memo: &str) -> bool {
    memo.len() == CORRELATION_KEY_LENGTH && memo.chars().all(|c| c.is_ascii_alphanumeric())
}
