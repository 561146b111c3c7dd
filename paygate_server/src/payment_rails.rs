use paygate_engine::{
    rails::{InvoiceRail, TransferRail},
    traits::{ExchangeRates, OrderManagement},
};

use crate::config::RailConfig;

/// Anything that can store orders and price them
pub trait GatewayBackend: OrderManagement + ExchangeRates {}

impl<T> GatewayBackend for T where T: OrderManagement + ExchangeRates {}

/// The rails this server sells on
pub struct PaymentRails<B, I> {
    pub credit: InvoiceRail<I, B>,
    pub native: TransferRail<B>,
    pub stablecoin: Option<TransferRail<B>>,
}

impl<B: Clone, I> PaymentRails<B, I> {
    pub fn new(db: B, invoices: I, config: &RailConfig) -> Self {
        let credit = InvoiceRail::new(invoices, db.clone(), &config.credit_code);
        let native = TransferRail::native(db.clone(), &config.native_code, &config.receiving_address);
        let stablecoin = config
            .stablecoin_master
            .as_ref()
            .map(|master| TransferRail::token(db, &config.stablecoin_code, &config.receiving_address, master));
        Self { credit, native, stablecoin }
    }
}
