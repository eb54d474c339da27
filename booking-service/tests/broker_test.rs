mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};
use std::time::Duration;

fn broker(name: &str, phone: &str) -> Value {
    json!({
        "name": name,
        "phone": phone,
        "commission": 2,
        "referenceDate": "2024-01-01"
    })
}

#[tokio::test]
async fn broker_name_with_digits_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, body) = app.post("/api/brokers", broker("John3", "9876543210")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"][0]["field"], "name");
    assert_eq!(
        body["fields"][0]["message"],
        "Name must contain only letters and spaces"
    );
}

#[tokio::test]
async fn phone_must_be_exactly_ten_digits() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post("/api/brokers", broker("John Doe", "12345")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "phone");

    let (status, body) = app
        .post("/api/brokers", broker("John Doe", "9876543210"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["tds"].as_f64(), Some(5.0));
}

#[tokio::test]
async fn commission_outside_percentage_range_is_rejected() {
    let app = TestApp::spawn().await;
    let mut body = broker("John Doe", "9876543210");
    body["commission"] = json!(120);

    let (status, body) = app.post("/api/brokers", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "commission");
}

#[tokio::test]
async fn brokers_list_newest_first_and_update() {
    let app = TestApp::spawn().await;
    let (_, first) = app.post("/api/brokers", broker("Ravi Kumar", "9000000001")).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (_, second) = app.post("/api/brokers", broker("Meena Iyer", "9000000002")).await;

    let (_, list) = app.get("/api/brokers").await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Meena Iyer", "Ravi Kumar"]);
    assert_ne!(first["_id"], second["_id"]);

    let (status, updated) = app
        .put(
            &format!("/api/brokers/{}", first["_id"].as_str().unwrap()),
            json!({"tds": 10}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["tds"].as_f64(), Some(10.0));
    assert_eq!(updated["name"], "Ravi Kumar");
}

#[tokio::test]
async fn referenced_broker_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let (_, broker) = app.post("/api/brokers", broker("Ravi Kumar", "9000000001")).await;
    let broker_id = broker["_id"].as_str().unwrap();

    let plot = app.create_plot(1).await;
    let mut booking = app.booking_body(plot["_id"].as_str().unwrap(), 100_000);
    booking["brokerId"] = json!(broker_id);
    let (status, created) = app.post("/api/bookings", booking).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("/api/brokers/{}", broker_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Unlinking the broker frees it.
    let booking_id = created["booking"]["_id"].as_str().unwrap();
    let (status, updated) = app
        .put(&format!("/api/bookings/{}", booking_id), json!({"brokerId": ""}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["brokerId"], Value::Null);

    let (status, _) = app.delete(&format!("/api/brokers/{}", broker_id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn booking_with_unknown_broker_is_not_found() {
    let app = TestApp::spawn().await;
    let plot = app.create_plot(1).await;
    let mut booking = app.booking_body(plot["_id"].as_str().unwrap(), 100_000);
    booking["brokerId"] = json!("missing-broker");

    let (status, _) = app.post("/api/bookings", booking).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn financials_sum_commission_over_referred_bookings() {
    let app = TestApp::spawn().await;
    let (_, broker) = app.post("/api/brokers", broker("Ravi Kumar", "9000000001")).await;
    let broker_id = broker["_id"].as_str().unwrap();

    for number in [1, 2] {
        let plot = app.create_plot(number).await;
        let mut booking = app.booking_body(plot["_id"].as_str().unwrap(), 100_000);
        booking["brokerId"] = json!(broker_id);
        let (status, _) = app.post("/api/bookings", booking).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, report) = app
        .get(&format!("/api/brokers/{}/financials", broker_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", report);

    let rows = report["bookings"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["gross"].as_f64(), Some(10_000.0));
    assert_eq!(rows[0]["tdsAmount"].as_f64(), Some(500.0));
    assert_eq!(rows[0]["net"].as_f64(), Some(9_500.0));
    assert_eq!(report["total"]["net"].as_f64(), Some(19_000.0));
}
