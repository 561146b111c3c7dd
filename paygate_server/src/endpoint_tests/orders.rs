use actix_web::{http::StatusCode, test::TestRequest};
use paygate_engine::{
    db_types::{Order, OrderStatusType, PaymentType, StatusHistoryEntry},
    traits::AccountManagement,
};
use serde_json::json;

use super::{
    helpers::{access_config, json, seeded_api, send},
    mocks::{working_invoices, MockInvoices},
};

const USER: i64 = 4242;

fn new_order(product_id: i64, payment_type: PaymentType) -> TestRequest {
    TestRequest::post()
        .uri("/orders")
        .set_json(json!({"user_id": USER, "product_id": product_id, "quantity": 1, "payment_type": payment_type}))
}

#[actix_web::test]
async fn health_check() {
    let (api, _) = seeded_api().await;
    let (status, body) = send(TestRequest::get().uri("/health"), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn credit_orders_get_an_invoice() {
    let (api, product) = seeded_api().await;
    let mut invoices = MockInvoices::new();
    invoices
        .expect_create_invoice()
        .times(1)
        .withf(|invoice| invoice.payload.len() == 16)
        .returning(|invoice| Ok(format!("https://t.me/$invoice-{}", invoice.payload)));
    let req = new_order(product.id, PaymentType::PlatformCredit);
    let (status, body) = send(req, &api, invoices, access_config()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order: Order = serde_json::from_str(&body).expect("Not an order");
    assert_eq!(order.user_id, USER);
    assert_eq!(order.status, OrderStatusType::Processing);
    assert_eq!(order.payment_link, format!("https://t.me/$invoice-{}", order.external_payment_id));
}

#[actix_web::test]
async fn native_orders_get_a_transfer_link() {
    let (api, product) = seeded_api().await;
    let req = new_order(product.id, PaymentType::OnChainNative);
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order: Order = serde_json::from_str(&body).expect("Not an order");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert!(order.payment_link.starts_with("ton://transfer/UQservice?amount="));
    assert!(order.payment_link.ends_with(&order.external_payment_id));
}

#[actix_web::test]
async fn unconfigured_rails_are_refused() {
    let (api, product) = seeded_api().await;
    let req = new_order(product.id, PaymentType::Stablecoin);
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "RAIL_NOT_AVAILABLE");
}

#[actix_web::test]
async fn unknown_products_are_not_found() {
    let (api, product) = seeded_api().await;
    let req = new_order(product.id + 100, PaymentType::OnChainNative);
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "PRODUCT_NOT_FOUND");
}

#[actix_web::test]
async fn malformed_order_requests() {
    let (api, _) = seeded_api().await;
    let req = TestRequest::post().uri("/orders").set_json(json!({"user_id": USER, "payment_type": "Cash"}));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_REQUEST");
}

#[actix_web::test]
async fn oversized_quantities_are_bad_requests() {
    let (api, product) = seeded_api().await;
    for quantity in [1000, i64::MAX / 100] {
        let order = json!({
            "user_id": USER,
            "product_id": product.id,
            "quantity": quantity,
            "payment_type": PaymentType::OnChainNative,
        });
        let req = TestRequest::post().uri("/orders").set_json(order);
        let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json(&body)["code"], "INVALID_QUANTITY");
    }
    assert!(api.db().fetch_orders_for_user(USER).await.unwrap().is_empty());
}

#[actix_web::test]
async fn the_eleventh_open_order_conflicts() {
    let (api, product) = seeded_api().await;
    for _ in 0..10 {
        let (status, _) =
            send(new_order(product.id, PaymentType::OnChainNative), &api, MockInvoices::new(), access_config()).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let req = new_order(product.id, PaymentType::PlatformCredit);
    let (status, body) = send(req, &api, working_invoices(), access_config()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["code"], "ORDER_MAX_COUNT_REACHED");
}

#[actix_web::test]
async fn fetch_orders_and_their_history() {
    let (api, product) = seeded_api().await;
    let req = new_order(product.id, PaymentType::PlatformCredit);
    let (_, body) = send(req, &api, working_invoices(), access_config()).await;
    let created: Order = serde_json::from_str(&body).expect("Not an order");

    let req = TestRequest::get().uri(&format!("/orders/{}", created.id));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Order = serde_json::from_str(&body).expect("Not an order");
    assert_eq!(fetched.external_payment_id, created.external_payment_id);

    let req = TestRequest::get().uri(&format!("/orders/{}/history", created.id));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<StatusHistoryEntry> = serde_json::from_str(&body).expect("Not a history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_status, OrderStatusType::Processing);

    let req = TestRequest::get().uri("/orders/99999/history");
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "ORDER_NOT_FOUND");
}

#[actix_web::test]
async fn submitted_transfers_wait_for_the_ledger() {
    let (api, product) = seeded_api().await;
    let (_, body) =
        send(new_order(product.id, PaymentType::OnChainNative), &api, MockInvoices::new(), access_config()).await;
    let order: Order = serde_json::from_str(&body).expect("Not an order");

    let submit = || TestRequest::post().uri(&format!("/orders/{}/submitted", order.id));
    let (status, body) = send(submit(), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated: Order = serde_json::from_str(&body).expect("Not an order");
    assert_eq!(updated.status, OrderStatusType::Processing);

    let (status, body) = send(submit(), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["code"], "ORDER_STATUS_INVALID");
}

#[actix_web::test]
async fn credit_orders_cannot_be_submitted() {
    let (api, product) = seeded_api().await;
    let req = new_order(product.id, PaymentType::PlatformCredit);
    let (_, body) = send(req, &api, working_invoices(), access_config()).await;
    let order: Order = serde_json::from_str(&body).expect("Not an order");
    let req = TestRequest::post().uri(&format!("/orders/{}/submitted", order.id));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_REQUEST");
}
