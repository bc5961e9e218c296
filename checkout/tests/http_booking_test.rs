//! HTTP booking client and pricing source against a mock server.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zoo_checkout::booking::{BookingApi, BookingLine, BookingSubmission, HttpBookingApi};
use zoo_checkout::tariff::{HttpPricingSource, PricingSource};
use zoo_checkout::types::{ItemCode, PaymentMode};
use zoo_checkout::{CatalogError, CheckoutError, Rupees};

fn submission() -> BookingSubmission {
    BookingSubmission {
        visit_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        payment_mode: PaymentMode::Online,
        items: vec![
            BookingLine {
                item_code: ItemCode::from("zoo_adult"),
                label: "Zoo entry (adult)".to_string(),
                quantity: 2,
            },
            BookingLine {
                item_code: ItemCode::from("parking_4w_lmv"),
                label: "Parking (car / LMV)".to_string(),
                quantity: 1,
            },
        ],
        visitor_name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        mobile: "9999999999".to_string(),
    }
}

fn client(server: &MockServer, token: Option<&str>) -> HttpBookingApi {
    HttpBookingApi::new(
        &server.uri(),
        "/api/bookings",
        token.map(str::to_string),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn posts_camel_case_body_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({
            "visitDate": "2025-01-10",
            "paymentMode": "online",
            "items": [
                {"itemCode": "zoo_adult", "label": "Zoo entry (adult)", "quantity": 2},
                {"itemCode": "parking_4w_lmv", "label": "Parking (car / LMV)", "quantity": 1}
            ],
            "visitorName": "Asha",
            "email": "asha@example.com",
            "mobile": "9999999999"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "ticketId": "TCK123"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, Some("secret"))
        .create_booking(submission())
        .await
        .unwrap();

    assert_eq!(response.into_ticket().unwrap().as_str(), "TCK123");
}

#[tokio::test]
async fn success_without_ticket_is_reported_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, None).create_booking(submission()).await.unwrap();

    assert_eq!(response.into_ticket(), Err(CheckoutError::MissingTicketId));
}

#[tokio::test]
async fn server_rejection_surfaces_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "message": "Visit date is fully booked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, None).create_booking(submission()).await;

    assert_eq!(
        result,
        Err(CheckoutError::Server { message: "Visit date is fully booked".to_string() })
    );
}

#[tokio::test]
async fn server_error_without_body_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, None).create_booking(submission()).await;

    assert_eq!(
        result,
        Err(CheckoutError::Server { message: "Service Unavailable".to_string() })
    );
}

#[tokio::test]
async fn slow_service_is_a_network_error_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "ticketId": "LATE"}))
                .set_delay(Duration::from_secs(5)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, None).create_booking(submission()).await;

    assert!(matches!(result, Err(CheckoutError::Network(_))));
}

#[tokio::test]
async fn pricing_source_loads_tariff_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tariff.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "zoo_adult", "label": "Adult", "price": 60, "category": "entry", "displayOrder": 1},
            {"code": "toy_train", "label": "Toy train", "price": 25, "category": "transport", "displayOrder": 2}
        ])))
        .mount(&server)
        .await;

    let source = HttpPricingSource::new(format!("{}/tariff.json", server.uri()), Duration::from_secs(2));
    let catalog = source.load().await.unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.price(&ItemCode::from("zoo_adult")), Some(Rupees::new(60)));
}

#[tokio::test]
async fn unavailable_pricing_source_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = HttpPricingSource::new(server.uri(), Duration::from_secs(2));

    assert!(matches!(source.load().await, Err(CatalogError::Unavailable(_))));
}
