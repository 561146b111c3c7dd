use paygate_common::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransferError {
    #[error("No wallet is available for this session. {0}")]
    WalletUnavailable(String),
    #[error("The transfer was rejected. {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: String,
    pub amount: Amount,
    pub comment: String,
}

#[allow(async_fn_in_trait)]
pub trait Wallet {
    async fn send_transfer(&self, transfer: Transfer) -> Result<(), TransferError>;
}

/// Hands out the wallet connected to a user's chat session.
#[allow(async_fn_in_trait)]
pub trait WalletClient {
    type Wallet: Wallet;

    async fn create_or_reuse_wallet(&self, session_id: &str) -> Result<Self::Wallet, TransferError>;
}
