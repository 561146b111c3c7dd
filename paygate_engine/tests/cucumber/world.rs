use std::collections::HashMap;

use cucumber::World;
use log::*;
use paygate_engine::{
    db_types::{Order, Product},
    order_objects::CheckoutAnswer,
    rails::{InvoiceRail, TransferRail},
    test_utils::prepare_env::tear_down,
    traits::OrderManagement,
    OrderFlowApi,
    OrderFlowError,
    OrderFlowConfig,
    SqliteDatabase,
};

use crate::support::{seeded_api, FakeInvoices, FakeLedger, SERVICE_ADDRESS};

#[derive(Debug, Default, World)]
pub struct OrderWorld {
    pub system: Option<OrderSystem>,
}

impl OrderWorld {
    pub fn system(&mut self) -> &mut OrderSystem {
        self.system.as_mut().expect("No system. Start the scenario with 'Given a fresh install'")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("No system").api
    }
}

#[derive(Debug)]
pub struct OrderSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub products: Vec<Product>,
    pub ledger: FakeLedger,
    pub invoice_rail: InvoiceRail<FakeInvoices, SqliteDatabase>,
    pub transfer_rail: TransferRail<SqliteDatabase>,
    /// Orders created in the scenario, by the alias the scenario gave them
    pub orders: HashMap<String, Order>,
    pub last_error: Option<OrderFlowError>,
    pub last_answer: Option<CheckoutAnswer>,
}

impl OrderSystem {
    pub async fn new() -> Self {
        let (api, products) = seeded_api(OrderFlowConfig::default()).await;
        let db_path = api.db().url().to_string();
        debug!("🚀️ Scenario database at {db_path}");
        let invoice_rail = InvoiceRail::new(FakeInvoices::default(), api.db().clone(), "XTR");
        let transfer_rail = TransferRail::native(api.db().clone(), "TON", SERVICE_ADDRESS);
        Self {
            db_path,
            api,
            products,
            ledger: FakeLedger::default(),
            invoice_rail,
            transfer_rail,
            orders: HashMap::new(),
            last_error: None,
            last_answer: None,
        }
    }

    pub fn product_id(&self, name: &str) -> i64 {
        self.products.iter().find(|p| p.name == name).map(|p| p.id).unwrap_or_else(|| panic!("No product '{name}'"))
    }

    pub fn order(&self, alias: &str) -> &Order {
        self.orders.get(alias).unwrap_or_else(|| panic!("No order called '{alias}'"))
    }

    pub async fn shut_down(self) {
        tear_down(self.api).await;
    }
}
