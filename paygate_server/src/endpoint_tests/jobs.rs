use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use paygate_engine::{
    db_types::{NewProduct, Order, OrderStatusType, PaymentType},
    exchange_objects::ExchangeRate,
    test_utils::prepare_env::prepare_test_api,
    traits::{AccountManagement, ExchangeRates, LedgerError, LedgerPage, LedgerTransaction},
    LedgerReconciler,
    OrderFlowConfig,
    ReconciliationConfig,
};
use serde_json::json;

use super::{
    helpers::{access_config, seeded_api, send, RECEIVING_ADDRESS},
    mocks::{MockInvoices, MockLedger, MockNotifier},
};
use crate::{expiry_worker::run_expiry_job, ledger_worker::run_reconciliation};

fn native_order(product_id: i64) -> TestRequest {
    TestRequest::post()
        .uri("/orders")
        .set_json(json!({"user_id": 77, "product_id": product_id, "payment_type": "OnChainNative"}))
}

#[actix_web::test]
async fn expiry_job_counts_expired_orders() {
    let config = OrderFlowConfig { order_expiry: Duration::minutes(-1), ..Default::default() };
    let api = prepare_test_api(config).await;
    api.db().set_exchange_rate(&ExchangeRate::new("TON", 2_000_000.0, None)).await.expect("Error setting rate");
    let product =
        api.db().upsert_product(NewProduct::coins("100 coins", 100, 199)).await.expect("Error adding product");
    for _ in 0..2 {
        let (status, _) = send(native_order(product.id), &api, MockInvoices::new(), access_config()).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(run_expiry_job(&api).await, 2);
    assert_eq!(run_expiry_job(&api).await, 0);
    let orders = api.db().fetch_orders_for_user(77).await.expect("Error fetching orders");
    assert!(orders.iter().all(|o| o.status == OrderStatusType::Expired));
}

#[actix_web::test]
async fn reconciliation_job_settles_submitted_transfers() {
    let (api, product) = seeded_api().await;
    let (_, body) = send(native_order(product.id), &api, MockInvoices::new(), access_config()).await;
    let order: Order = serde_json::from_str(&body).expect("Not an order");
    let req = TestRequest::post().uri(&format!("/orders/{}/submitted", order.id));
    let (status, _) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);

    let paid = LedgerTransaction {
        id: "tx1".into(),
        amount: order.amount,
        comment: Some(order.external_payment_id.clone()),
        block_time: Utc::now().timestamp(),
    };
    let mut ledger = MockLedger::new();
    ledger
        .expect_list_transactions()
        .withf(|addresses, _, offset, _| addresses == [RECEIVING_ADDRESS.to_string()] && *offset == 0)
        .times(1)
        .returning(move |_, _, _, _| Ok(LedgerPage::new(vec![paid.clone()])));
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().withf(|user_id, _| *user_id == 77).times(1).returning(|_, _| Ok(()));
    let config = ReconciliationConfig::new(PaymentType::OnChainNative, vec![RECEIVING_ADDRESS.into()], "TON");
    let reconcilers = vec![LedgerReconciler::new(api.clone(), ledger, notifier, config)];

    assert_eq!(run_reconciliation(&reconcilers, Utc::now() - Duration::hours(1)).await, 1);
    let stored = api.db().fetch_order(order.id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(stored.status, OrderStatusType::Success);
    let user = api.db().fetch_user(77).await.expect("Error fetching user").expect("User is missing");
    assert_eq!(user.coin_balance, 100);
}

#[actix_web::test]
async fn an_unreachable_ledger_completes_nothing() {
    let (api, _) = seeded_api().await;
    let mut ledger = MockLedger::new();
    ledger.expect_list_transactions().returning(|_, _, _, _| Err(LedgerError::Unavailable("timeout".into())));
    let mut notifier = MockNotifier::new();
    notifier.expect_notify().times(0);
    let config = ReconciliationConfig::new(PaymentType::OnChainNative, vec![RECEIVING_ADDRESS.into()], "TON");
    let reconcilers = vec![LedgerReconciler::new(api.clone(), ledger, notifier, config)];
    assert_eq!(run_reconciliation(&reconcilers, Utc::now()).await, 0);
}
