use std::sync::Arc;

use log::*;
use paygate_engine::traits::{LedgerClient, LedgerError, LedgerPage, LedgerTransaction};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::de::DeserializeOwned;

use crate::{
    config::LedgerApiConfig,
    data_objects::{IndexerTransaction, JettonTransfer, JettonTransfersResponse, TransactionsResponse},
    ClientError,
};

/// Which transfers an indexer query returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerSource {
    /// Native coin transfers into the receiving addresses
    Native,
    /// Token transfers of the given token master contract into the receiving addresses
    Jetton { master: String },
}

#[derive(Clone)]
pub struct LedgerApi {
    config: LedgerApiConfig,
    source: LedgerSource,
    client: Arc<Client>,
}

impl LedgerApi {
    pub fn new(config: LedgerApiConfig, source: LedgerSource) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::with_capacity(2);
        if !config.api_key.is_empty() {
            let val = HeaderValue::from_str(config.api_key.reveal().as_str())
                .map_err(|e| ClientError::Initialization(e.to_string()))?;
            headers.insert("X-API-Key", val);
        }
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| ClientError::Initialization(e.to_string()))?;
        Ok(Self { config, source, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub fn source(&self) -> &LedgerSource {
        &self.source
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ClientError> {
        let url = self.url(path);
        trace!("🧾️ Sending indexer query: {url}");
        let response =
            self.client.get(url).query(params).send().await.map_err(|e| ClientError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            response.json::<T>().await.map_err(|e| ClientError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ClientError::RestResponseError(e.to_string()))?;
            Err(ClientError::QueryError { status, message })
        }
    }

    /// Fetches one page of indexer records for a single address and keeps the incoming transfers.
    pub async fn fetch_page(
        &self,
        address: &str,
        since: i64,
        offset: usize,
        limit: usize,
    ) -> Result<LedgerPage, ClientError> {
        let mut params = vec![
            ("start_utime", since.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("sort", "asc".to_string()),
        ];
        let page = match &self.source {
            LedgerSource::Native => {
                params.push(("account", address.to_string()));
                let response = self.get::<TransactionsResponse>("/transactions", &params).await?;
                incoming_transfers(response.transactions, IndexerTransaction::into_ledger_transaction)
            },
            LedgerSource::Jetton { master } => {
                params.push(("owner_address", address.to_string()));
                params.push(("jetton_master", master.clone()));
                params.push(("direction", "in".to_string()));
                let response = self.get::<JettonTransfersResponse>("/jetton/transfers", &params).await?;
                incoming_transfers(response.jetton_transfers, JettonTransfer::into_ledger_transaction)
            },
        };
        Ok(page)
    }
}

/// Converts a page of raw indexer records. Every record counts towards the page size, but only incoming transfers
/// are kept. A record that cannot be read is logged and skipped so that the rest of the page still gets matched.
pub fn incoming_transfers<T, F>(records: Vec<T>, convert: F) -> LedgerPage
where F: Fn(T) -> Result<Option<LedgerTransaction>, ClientError> {
    let count = records.len();
    let transactions = records
        .into_iter()
        .filter_map(|record| match convert(record) {
            Ok(tx) => tx,
            Err(e) => {
                warn!("🧾️ Skipping an unreadable indexer record. {e}");
                None
            },
        })
        .collect();
    LedgerPage::with_records(transactions, count)
}

impl From<ClientError> for LedgerError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::JsonError(s) | ClientError::InvalidAmount(s) => LedgerError::InvalidResponse(s),
            e => LedgerError::Unavailable(e.to_string()),
        }
    }
}

impl LedgerClient for LedgerApi {
    /// The indexer is queried per address. With several addresses, `offset` and `limit` apply to each address in
    /// turn, which keeps paging correct as long as the caller stops at the first short page.
    async fn list_transactions(
        &self,
        addresses: &[String],
        since: i64,
        offset: usize,
        limit: usize,
    ) -> Result<LedgerPage, LedgerError> {
        let mut result = LedgerPage::default();
        for address in addresses {
            let page = self.fetch_page(address, since, offset, limit).await?;
            debug!("🧾️ {} transfers in {} records into {address} at offset {offset}", page.transactions.len(), page.records);
            result.extend(page);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use paygate_common::{Amount, Secret};

    use super::*;

    #[test]
    fn urls() {
        let config = LedgerApiConfig { base_url: "https://indexer.example/api/v3/".into(), api_key: Secret::default() };
        let api = LedgerApi::new(config, LedgerSource::Native).unwrap();
        assert_eq!(api.url("/transactions"), "https://indexer.example/api/v3/transactions");
        assert_eq!(api.source(), &LedgerSource::Native);
    }

    #[test]
    fn bad_api_keys_are_rejected() {
        let config = LedgerApiConfig { base_url: "http://localhost".into(), api_key: Secret::new("bad\nkey".into()) };
        assert!(matches!(LedgerApi::new(config, LedgerSource::Native), Err(ClientError::Initialization(_))));
    }

    #[test]
    fn mixed_pages_count_every_record() {
        let json = r#"{"transactions": [
            {"hash": "in1", "now": 1, "in_msg": {"source": "UQa", "value": "100", "message_content": null}},
            {"hash": "out", "now": 2, "in_msg": {"source": null, "value": null, "message_content": null}},
            {"hash": "in2", "now": 3, "in_msg": {"source": "UQb", "value": "200", "message_content": null}},
            {"hash": "bad", "now": 4, "in_msg": {"source": "UQc", "value": "lots", "message_content": null}}
        ]}"#;
        let response: TransactionsResponse = serde_json::from_str(json).unwrap();
        let page = incoming_transfers(response.transactions, IndexerTransaction::into_ledger_transaction);
        assert_eq!(page.records, 4);
        let ids = page.transactions.iter().map(|tx| tx.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["in1", "in2"]);
        assert_eq!(page.transactions[1].amount, Amount::from(200));
    }

    #[test]
    fn unreadable_jetton_amounts_are_skipped() {
        let json = r#"{"jetton_transfers": [
            {"transaction_hash": "j1", "transaction_now": 10, "amount": "-5"},
            {"transaction_hash": "j2", "transaction_now": 11, "amount": "7"}
        ]}"#;
        let response: JettonTransfersResponse = serde_json::from_str(json).unwrap();
        let page = incoming_transfers(response.jetton_transfers, JettonTransfer::into_ledger_transaction);
        assert_eq!(page.records, 2);
        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.transactions[0].id, "j2");
    }
}
