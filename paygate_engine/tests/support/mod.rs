#![allow(dead_code)]
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use chrono::Utc;
use mockall::mock;
use paygate_common::Amount;
use paygate_engine::{
    db_types::{NewProduct, Product},
    exchange_objects::ExchangeRate,
    test_utils::prepare_env::prepare_test_api,
    traits::{
        AccountManagement,
        ExchangeRates,
        InvoiceClient,
        InvoiceRequest,
        LedgerClient,
        LedgerError,
        LedgerPage,
        LedgerTransaction,
        Notifier,
        NotifyError,
        RailError,
        Transfer,
        TransferError,
        Wallet,
        WalletClient,
    },
    OrderFlowApi,
    OrderFlowConfig,
    SqliteDatabase,
};

pub const TON_PER_CENT: f64 = 2_000_000.0;
pub const XTR_PER_CENT: f64 = 0.5;
pub const SERVICE_ADDRESS: &str = "UQservice";

/// A migrated database with exchange rates and a catalogue of three products.
pub async fn seeded_api(config: OrderFlowConfig) -> (OrderFlowApi<SqliteDatabase>, Vec<Product>) {
    let api = prepare_test_api(config).await;
    let db = api.db();
    for (currency, rate) in [("TON", TON_PER_CENT), ("XTR", XTR_PER_CENT), ("USDT", 10_000.0)] {
        db.set_exchange_rate(&ExchangeRate::new(currency, rate, None)).await.expect("Error setting exchange rate");
    }
    let mut products = Vec::new();
    for p in [
        NewProduct::coins("100 coins", 100, 199),
        NewProduct::subscription("Premium month", 30, 499),
        NewProduct::bundle("Starter pack", 500, 7, 999),
    ] {
        products.push(db.upsert_product(p).await.expect("Error adding product"));
    }
    (api, products)
}

#[derive(Debug, Clone, Default)]
pub struct FakeInvoices {
    pub fail: bool,
    pub issued: Arc<Mutex<Vec<InvoiceRequest>>>,
}

impl FakeInvoices {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn issued(&self) -> Vec<InvoiceRequest> {
        self.issued.lock().unwrap().clone()
    }
}

impl InvoiceClient for FakeInvoices {
    async fn create_invoice(&self, invoice: InvoiceRequest) -> Result<String, RailError> {
        if self.fail {
            return Err(RailError::PaymentLinkFailed("invoice service is down".into()));
        }
        let link = format!("https://t.me/$invoice-{}", invoice.payload);
        self.issued.lock().unwrap().push(invoice);
        Ok(link)
    }
}

/// An in-memory ledger that counts how often it is queried.
#[derive(Debug, Clone, Default)]
pub struct FakeLedger {
    /// Every ledger record. `None` stands for a record that is not an incoming transfer.
    records: Arc<Mutex<Vec<(i64, Option<LedgerTransaction>)>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeLedger {
    pub fn push(&self, amount: i64, comment: Option<&str>) {
        let mut records = self.records.lock().unwrap();
        let id = format!("tx-{}", records.len());
        let block_time = Utc::now().timestamp();
        let tx = LedgerTransaction { id, amount: Amount::from(amount), comment: comment.map(String::from), block_time };
        records.push((block_time, Some(tx)));
    }

    /// Adds a record the ledger reports but that is not an incoming transfer, such as an outgoing payment.
    pub fn push_outgoing(&self) {
        self.records.lock().unwrap().push((Utc::now().timestamp(), None));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LedgerClient for FakeLedger {
    async fn list_transactions(
        &self,
        _addresses: &[String],
        since: i64,
        offset: usize,
        limit: usize,
    ) -> Result<LedgerPage, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        let page = records.iter().filter(|(t, _)| *t >= since).skip(offset).take(limit).collect::<Vec<_>>();
        let transactions = page.iter().filter_map(|(_, tx)| tx.clone()).collect();
        Ok(LedgerPage::with_records(transactions, page.len()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeWallets {
    pub unavailable: bool,
    pub reject: bool,
    pub sent: Arc<Mutex<Vec<Transfer>>>,
}

pub struct FakeWallet {
    reject: bool,
    sent: Arc<Mutex<Vec<Transfer>>>,
}

impl Wallet for FakeWallet {
    async fn send_transfer(&self, transfer: Transfer) -> Result<(), TransferError> {
        if self.reject {
            return Err(TransferError::Rejected("user declined".into()));
        }
        self.sent.lock().unwrap().push(transfer);
        Ok(())
    }
}

impl WalletClient for FakeWallets {
    type Wallet = FakeWallet;

    async fn create_or_reuse_wallet(&self, session_id: &str) -> Result<FakeWallet, TransferError> {
        if self.unavailable {
            return Err(TransferError::WalletUnavailable(format!("no wallet connected for {session_id}")));
        }
        Ok(FakeWallet { reject: self.reject, sent: Arc::clone(&self.sent) })
    }
}

mock! {
    pub Notifier {}
    impl Notifier for Notifier {
        async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
    }
}
