use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Could not notify user {user_id}. {reason}")]
pub struct NotifyError {
    pub user_id: i64,
    pub reason: String,
}

/// Sends a short text message to a user. Best effort: failures are logged by the caller and otherwise ignored.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}
