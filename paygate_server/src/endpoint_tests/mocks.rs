use mockall::mock;
use paygate_engine::traits::{
    InvoiceClient,
    InvoiceRequest,
    LedgerClient,
    LedgerError,
    LedgerPage,
    Notifier,
    NotifyError,
    RailError,
};

mock! {
    pub Invoices {}
    impl InvoiceClient for Invoices {
        async fn create_invoice(&self, invoice: InvoiceRequest) -> Result<String, RailError>;
    }
}

mock! {
    pub Ledger {}
    impl LedgerClient for Ledger {
        async fn list_transactions(
            &self,
            addresses: &[String],
            since: i64,
            offset: usize,
            limit: usize,
        ) -> Result<LedgerPage, LedgerError>;
    }
}

mock! {
    pub Notifier {}
    impl Notifier for Notifier {
        async fn notify(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
    }
}

/// An invoice client that hands out a link for every request.
pub fn working_invoices() -> MockInvoices {
    let mut invoices = MockInvoices::new();
    invoices.expect_create_invoice().returning(|invoice| Ok(format!("https://t.me/$invoice-{}", invoice.payload)));
    invoices
}
