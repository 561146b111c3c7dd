//! Wire types for the ledger indexer and the bot API.
use paygate_engine::{order_objects::CheckoutAnswer, traits::LedgerTransaction};
use serde::{Deserialize, Serialize};

use crate::{helpers::parse_amount, ClientError};

//--------------------------------------      Ledger indexer      ------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<IndexerTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerTransaction {
    pub hash: String,
    /// Block time, unix seconds
    pub now: i64,
    pub in_msg: Option<InboundMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub source: Option<String>,
    /// Amount in nano-units, as a decimal string. Absent for external messages.
    pub value: Option<String>,
    pub message_content: Option<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageContent {
    pub decoded: Option<DecodedContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodedContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub comment: Option<String>,
}

impl DecodedContent {
    fn text_comment(&self) -> Option<String> {
        (self.content_type == "text_comment").then(|| self.comment.clone()).flatten()
    }
}

impl IndexerTransaction {
    /// Converts an indexer record into a ledger transfer. Outgoing and external transactions carry no inbound value
    /// and are dropped.
    pub fn into_ledger_transaction(self) -> Result<Option<LedgerTransaction>, ClientError> {
        let Some(msg) = self.in_msg else {
            return Ok(None);
        };
        let Some(value) = msg.value.as_deref() else {
            return Ok(None);
        };
        if msg.source.is_none() {
            return Ok(None);
        }
        let amount = parse_amount(value)?;
        let comment = msg.message_content.and_then(|c| c.decoded).and_then(|d| d.text_comment());
        Ok(Some(LedgerTransaction { id: self.hash, amount, comment, block_time: self.now }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JettonTransfersResponse {
    #[serde(default)]
    pub jetton_transfers: Vec<JettonTransfer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JettonTransfer {
    pub transaction_hash: String,
    pub transaction_now: i64,
    pub amount: String,
    #[serde(default)]
    pub transaction_aborted: bool,
    pub decoded_forward_payload: Option<DecodedContent>,
}

impl JettonTransfer {
    pub fn into_ledger_transaction(self) -> Result<Option<LedgerTransaction>, ClientError> {
        if self.transaction_aborted {
            return Ok(None);
        }
        let amount = parse_amount(&self.amount)?;
        let comment = self.decoded_forward_payload.and_then(|d| d.text_comment());
        Ok(Some(LedgerTransaction { id: self.transaction_hash, amount, comment, block_time: self.transaction_now }))
    }
}

//--------------------------------------         Bot API          ------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct BotResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> BotResponse<T> {
    pub fn into_result(self) -> Result<T, ClientError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (_, _) => Err(ClientError::ApiError(self.description.unwrap_or_else(|| "no description".into()))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceLink {
    pub title: String,
    pub description: String,
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

/// The subset of a bot update the gateway cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: BotUser,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub username: Option<String>,
}

/// A pre-checkout answer, sent back as the body of the webhook response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreCheckoutAnswer {
    pub method: String,
    pub pre_checkout_query_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PreCheckoutAnswer {
    pub fn new(query_id: &str, answer: &CheckoutAnswer) -> Self {
        let (ok, error_message) = match answer {
            CheckoutAnswer::Accept { .. } => (true, None),
            CheckoutAnswer::Reject { reason } => (false, Some(reason.clone())),
        };
        Self {
            method: "answerPreCheckoutQuery".to_string(),
            pre_checkout_query_id: query_id.to_string(),
            ok,
            error_message,
        }
    }
}
