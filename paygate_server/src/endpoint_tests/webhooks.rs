use actix_web::{http::StatusCode, test::TestRequest};
use paygate_engine::{
    db_types::{Order, OrderStatusType},
    traits::AccountManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use rail_clients::data_objects::PreCheckoutAnswer;
use serde_json::json;

use super::{
    helpers::{access_config, json, seeded_api, send, WEBHOOK_SECRET},
    mocks::{working_invoices, MockInvoices},
};
use crate::{config::AccessConfig, routes::WEBHOOK_SECRET_HEADER};

async fn credit_order(api: &OrderFlowApi<SqliteDatabase>, product_id: i64) -> Order {
    let req = TestRequest::post()
        .uri("/orders")
        .set_json(json!({"user_id": 42, "product_id": product_id, "payment_type": "PlatformCredit"}));
    let (status, body) = send(req, api, working_invoices(), access_config()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    serde_json::from_str(&body).expect("Not an order")
}

fn precheckout(query_id: &str, payload: &str) -> TestRequest {
    TestRequest::post().uri("/webhook/precheckout").insert_header((WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET)).set_json(
        json!({
            "update_id": 1,
            "pre_checkout_query": {
                "id": query_id,
                "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
                "currency": "XTR",
                "total_amount": 100,
                "invoice_payload": payload
            }
        }),
    )
}

#[actix_web::test]
async fn checkout_is_accepted_once() {
    let (api, product) = seeded_api().await;
    let order = credit_order(&api, product.id).await;

    let (status, body) =
        send(precheckout("q1", &order.external_payment_id), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let answer: PreCheckoutAnswer = serde_json::from_str(&body).expect("Not an answer");
    assert!(answer.ok, "{body}");
    assert_eq!(answer.pre_checkout_query_id, "q1");
    assert_eq!(answer.method, "answerPreCheckoutQuery");

    let paid = api.db().fetch_order(order.id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(paid.status, OrderStatusType::Success);
    let user = api.db().fetch_user(42).await.expect("Error fetching user").expect("User is missing");
    assert_eq!(user.coin_balance, 100);

    let (status, body) =
        send(precheckout("q2", &order.external_payment_id), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let answer: PreCheckoutAnswer = serde_json::from_str(&body).expect("Not an answer");
    assert!(!answer.ok);
    assert!(answer.error_message.is_some());
    let user = api.db().fetch_user(42).await.expect("Error fetching user").expect("User is missing");
    assert_eq!(user.coin_balance, 100);
}

#[actix_web::test]
async fn unknown_payloads_are_refused() {
    let (api, _) = seeded_api().await;
    let (status, body) = send(precheckout("q1", "NoSuchPayload00"), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let answer: PreCheckoutAnswer = serde_json::from_str(&body).expect("Not an answer");
    assert!(!answer.ok);
    let orders = api.db().fetch_orders_for_user(42).await.expect("Error fetching orders");
    assert!(orders.is_empty());
}

#[actix_web::test]
async fn webhook_secret_is_checked() {
    let (api, product) = seeded_api().await;
    let order = credit_order(&api, product.id).await;
    let update = json!({"update_id": 1, "pre_checkout_query": {"id": "q1", "from": {"id": 42}, "currency": "XTR",
        "total_amount": 100, "invoice_payload": order.external_payment_id}});

    let req = TestRequest::post().uri("/webhook/precheckout").set_json(update.clone());
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["code"], "UNAUTHORIZED");

    let req = TestRequest::post()
        .uri("/webhook/precheckout")
        .insert_header((WEBHOOK_SECRET_HEADER, "guess"))
        .set_json(update.clone());
    let (status, _) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stored = api.db().fetch_order(order.id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(stored.status, OrderStatusType::Processing);

    // No secret configured, no check
    let req = TestRequest::post().uri("/webhook/precheckout").set_json(update);
    let (status, body) = send(req, &api, MockInvoices::new(), AccessConfig::default()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["ok"], true);
}

#[actix_web::test]
async fn other_updates_are_ignored() {
    let (api, _) = seeded_api().await;
    let req = TestRequest::post()
        .uri("/webhook/precheckout")
        .insert_header((WEBHOOK_SECRET_HEADER, WEBHOOK_SECRET))
        .set_json(json!({"update_id": 7, "message": {"text": "hi"}}));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Ignored");
}
