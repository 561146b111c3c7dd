use log::*;
use paygate_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct LedgerApiConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
}

impl LedgerApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("PG_LEDGER_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ PG_LEDGER_API_URL not set, using https://toncenter.com/api/v3 as default");
            "https://toncenter.com/api/v3".to_string()
        });
        let api_key = Secret::new(std::env::var("PG_LEDGER_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ PG_LEDGER_API_KEY not set. Requests will be rate limited.");
            String::default()
        }));
        Self { base_url, api_key }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BotApiConfig {
    pub api_url: String,
    pub bot_token: Secret<String>,
    /// The currency code for invoices in platform credit
    pub currency: String,
}

impl BotApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PG_BOT_API_URL").unwrap_or_else(|_| {
            debug!("🪛️ PG_BOT_API_URL not set, using https://api.telegram.org as default");
            "https://api.telegram.org".to_string()
        });
        let bot_token = Secret::new(std::env::var("PG_BOT_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ PG_BOT_TOKEN not set, using (probably useless) default");
            "000000:invalid".to_string()
        }));
        let currency = std::env::var("PG_CREDIT_CODE").unwrap_or_else(|_| "XTR".to_string());
        Self { api_url, bot_token, currency }
    }
}
