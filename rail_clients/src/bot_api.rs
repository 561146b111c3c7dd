use std::sync::Arc;

use log::*;
use paygate_engine::traits::{InvoiceClient, InvoiceRequest, Notifier, NotifyError, RailError};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::BotApiConfig,
    data_objects::{BotResponse, CreateInvoiceLink, LabeledPrice, SendMessage},
    ClientError,
};

#[derive(Clone)]
pub struct BotApi {
    config: BotApiConfig,
    client: Arc<Client>,
}

impl BotApi {
    pub fn new(config: BotApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder().build().map_err(|e| ClientError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// The method URL. It embeds the bot token, so never log it.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_url.trim_end_matches('/'), self.config.bot_token.reveal())
    }

    pub async fn call<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T, ClientError> {
        trace!("🤖️ Calling bot method {method}");
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::RestResponseError(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        // Error replies carry the same envelope as successful ones, so the body is parsed either way
        let text = response.text().await.map_err(|e| ClientError::RestResponseError(e.without_url().to_string()))?;
        let envelope = serde_json::from_str::<BotResponse<T>>(&text)
            .map_err(|_| ClientError::QueryError { status, message: text.clone() })?;
        envelope.into_result()
    }

    pub fn invoice_body(&self, invoice: InvoiceRequest) -> CreateInvoiceLink {
        let price = LabeledPrice { label: invoice.title.clone(), amount: invoice.amount.value() };
        CreateInvoiceLink {
            title: invoice.title,
            description: invoice.description,
            payload: invoice.payload,
            currency: self.config.currency.clone(),
            prices: vec![price],
        }
    }

    pub async fn create_invoice_link(&self, invoice: InvoiceRequest) -> Result<String, ClientError> {
        let body = self.invoice_body(invoice);
        let link = self.call::<String, _>("createInvoiceLink", &body).await?;
        debug!("🤖️ Invoice link created for payload {}", body.payload);
        Ok(link)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ClientError> {
        let body = SendMessage { chat_id, text };
        let _message = self.call::<serde_json::Value, _>("sendMessage", &body).await?;
        trace!("🤖️ Message sent to {chat_id}");
        Ok(())
    }
}

impl InvoiceClient for BotApi {
    async fn create_invoice(&self, invoice: InvoiceRequest) -> Result<String, RailError> {
        self.create_invoice_link(invoice).await.map_err(|e| RailError::PaymentLinkFailed(e.to_string()))
    }
}

impl Notifier for BotApi {
    async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_message(user_id, text).await.map_err(|e| NotifyError { user_id, reason: e.to_string() })
    }
}
