use actix_web::{http::StatusCode, test::TestRequest};
use paygate_engine::{
    db_types::{Product, ProductKind},
    exchange_objects::ExchangeRate,
};
use serde_json::json;

use super::{
    helpers::{access_config, json, seeded_api, send, ADMIN_TOKEN},
    mocks::MockInvoices,
};
use crate::{config::AccessConfig, routes::ADMIN_TOKEN_HEADER};

fn premium_month() -> serde_json::Value {
    json!({"name": "Premium month", "kind": "Subscription", "coins": 0, "premium_days": 30, "price_cents": 499})
}

#[actix_web::test]
async fn admin_routes_need_the_token() {
    let (api, _) = seeded_api().await;
    let req = TestRequest::post().uri("/admin/products").set_json(premium_month());
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["code"], "UNAUTHORIZED");

    let req = TestRequest::post()
        .uri("/admin/rates")
        .insert_header((ADMIN_TOKEN_HEADER, "nope"))
        .set_json(json!({"currency": "TON", "units_per_cent": 1.0}));
    let (status, _) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_routes_are_off_without_a_token() {
    let (api, _) = seeded_api().await;
    let req = TestRequest::post().uri("/admin/products").insert_header((ADMIN_TOKEN_HEADER, "")).set_json(premium_month());
    let (status, _) = send(req, &api, MockInvoices::new(), AccessConfig::default()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn products_can_be_added() {
    let (api, coins) = seeded_api().await;
    let req =
        TestRequest::post().uri("/admin/products").insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN)).set_json(premium_month());
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let product: Product = serde_json::from_str(&body).expect("Not a product");
    assert_eq!(product.kind, ProductKind::Subscription);
    assert_eq!(product.premium_days, 30);

    let (status, body) = send(TestRequest::get().uri("/products"), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let products: Vec<Product> = serde_json::from_str(&body).expect("Not a product list");
    let ids = products.iter().map(|p| p.id).collect::<Vec<_>>();
    assert!(ids.contains(&coins.id));
    assert!(ids.contains(&product.id));
}

#[actix_web::test]
async fn rates_can_be_set_and_read() {
    let (api, _) = seeded_api().await;
    let req = TestRequest::post()
        .uri("/admin/rates")
        .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))
        .set_json(json!({"currency": "TON", "units_per_cent": 2_500_000.0}));
    let (status, body) = send(req, &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);

    let (status, body) = send(TestRequest::get().uri("/rates/TON"), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::OK);
    let rate: ExchangeRate = serde_json::from_str(&body).expect("Not a rate");
    assert_eq!(rate.units_per_cent, 2_500_000.0);

    let (status, body) = send(TestRequest::get().uri("/rates/DOGE"), &api, MockInvoices::new(), access_config()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn nonsense_rates_are_refused() {
    let (api, _) = seeded_api().await;
    for units_per_cent in [0.0, -1.0] {
        let req = TestRequest::post()
            .uri("/admin/rates")
            .insert_header((ADMIN_TOKEN_HEADER, ADMIN_TOKEN))
            .set_json(json!({"currency": "TON", "units_per_cent": units_per_cent}));
        let (status, _) = send(req, &api, MockInvoices::new(), access_config()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
