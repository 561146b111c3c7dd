mod correlation_key;

pub use correlation_key::{is_correlation_key, new_correlation_key, CORRELATION_KEY_LENGTH};
