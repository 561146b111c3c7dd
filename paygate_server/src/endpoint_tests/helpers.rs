use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use paygate_common::Secret;
use paygate_engine::{
    db_types::{NewProduct, Product},
    exchange_objects::ExchangeRate,
    test_utils::prepare_env::prepare_test_api,
    traits::{AccountManagement, ExchangeRates},
    OrderFlowApi,
    OrderFlowConfig,
    SqliteDatabase,
};

use super::mocks::MockInvoices;
use crate::{
    config::{AccessConfig, RailConfig},
    payment_rails::PaymentRails,
    server::configure_routes,
};

pub const RECEIVING_ADDRESS: &str = "UQservice";
pub const WEBHOOK_SECRET: &str = "hook-secret";
pub const ADMIN_TOKEN: &str = "admin-token";

/// A migrated database with a coins product and rates for the native coin and platform credit.
pub async fn seeded_api() -> (OrderFlowApi<SqliteDatabase>, Product) {
    let _ = env_logger::try_init();
    let api = prepare_test_api(OrderFlowConfig::default()).await;
    let db = api.db();
    db.set_exchange_rate(&ExchangeRate::new("TON", 2_000_000.0, None)).await.expect("Error setting rate");
    db.set_exchange_rate(&ExchangeRate::new("XTR", 0.5, None)).await.expect("Error setting rate");
    let product = db.upsert_product(NewProduct::coins("100 coins", 100, 199)).await.expect("Error adding product");
    (api, product)
}

pub fn rail_config() -> RailConfig {
    RailConfig { receiving_address: RECEIVING_ADDRESS.to_string(), ..Default::default() }
}

pub fn access_config() -> AccessConfig {
    AccessConfig { webhook_secret: Secret::new(WEBHOOK_SECRET.into()), admin_token: Secret::new(ADMIN_TOKEN.into()) }
}

pub async fn send(
    req: TestRequest,
    api: &OrderFlowApi<SqliteDatabase>,
    invoices: MockInvoices,
    access: AccessConfig,
) -> (StatusCode, String) {
    let rails = PaymentRails::new(api.db().clone(), invoices, &rail_config());
    let app = App::new()
        .app_data(web::Data::new(api.clone()))
        .app_data(web::Data::new(rails))
        .app_data(web::Data::new(access))
        .configure(configure_routes::<MockInvoices>);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON. {e}\n{body}"))
}
