mod common;

use axum::http::{Method, StatusCode};
use common::{amounts, payment_ids, TestApp};
use serde_json::json;

#[tokio::test]
async fn booking_seeds_invoice_with_first_payment() {
    let app = TestApp::spawn().await;
    let (booking, invoice) = app.create_booking(1, 100_000).await;

    assert_eq!(invoice["bookingId"], booking["_id"]);
    assert_eq!(invoice["version"], 0);
    assert_eq!(amounts(&invoice), vec![100_000.0]);
    assert_eq!(invoice["payments"][0]["kind"], "booking");
    assert_eq!(invoice["payments"][0]["ordinal"], "1st");
    assert_eq!(invoice["balance"].as_f64(), Some(400_000.0));
}

#[tokio::test]
async fn payments_accumulate_in_insertion_order() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();

    app.add_payment(invoice_id, 200_000).await;
    app.add_payment(invoice_id, 150_000).await;

    let (status, invoice) = app.get(&format!("/api/invoices/{}", invoice_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amounts(&invoice), vec![100_000.0, 200_000.0, 150_000.0]);
    assert_eq!(invoice["totalPaid"].as_f64(), Some(450_000.0));
    assert_eq!(invoice["totalCost"].as_f64(), Some(500_000.0));
    assert_eq!(invoice["balance"].as_f64(), Some(50_000.0));

    let ordinals: Vec<&str> = invoice["payments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["ordinal"].as_str().unwrap())
        .collect();
    assert_eq!(ordinals, ["1st", "2nd", "3rd"]);
}

#[tokio::test]
async fn editing_a_payment_changes_only_that_payment() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();
    app.add_payment(invoice_id, 50_000).await;
    let before = app.add_payment(invoice_id, 75_000).await;
    let ids = payment_ids(&before);

    let (status, after) = app
        .put(
            &format!("/api/invoices/{}/payments/{}", invoice_id, ids[1]),
            json!({
                "amount": 60_000,
                "paymentDate": "2024-03-05",
                "paymentType": "Cheque",
                "narration": "cheque 004512"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", after);
    assert_eq!(payment_ids(&after), ids);
    assert_eq!(amounts(&after), vec![100_000.0, 60_000.0, 75_000.0]);
    assert_eq!(after["payments"][1]["paymentType"], "Cheque");
    assert_eq!(after["payments"][1]["narration"], "cheque 004512");
    assert_eq!(after["payments"][0], before["payments"][0]);
    assert_eq!(after["payments"][2], before["payments"][2]);
}

#[tokio::test]
async fn deleting_the_middle_payment_keeps_the_others() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();
    app.add_payment(invoice_id, 20_000).await;
    let full = app.add_payment(invoice_id, 30_000).await;
    let ids = payment_ids(&full);

    let (status, after) = app
        .delete(&format!("/api/invoices/{}/payments/{}", invoice_id, ids[1]))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", after);
    assert_eq!(payment_ids(&after), vec![ids[0].clone(), ids[2].clone()]);
    assert_eq!(amounts(&after), vec![100_000.0, 30_000.0]);
    assert_eq!(after["payments"][1]["ordinal"], "2nd");

    // Deleting it again finds nothing.
    let (status, _) = app
        .delete(&format!("/api/invoices/{}/payments/{}", invoice_id, ids[1]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_payment_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();
    let first = invoice["payments"][0]["id"].as_str().unwrap();

    let (status, body) = app
        .delete(&format!("/api/invoices/{}/payments/{}", invoice_id, first))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "paymentId");
}

#[tokio::test]
async fn editing_booking_payment_updates_booking_first_payment() {
    let app = TestApp::spawn().await;
    let (booking, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();
    let first = invoice["payments"][0]["id"].as_str().unwrap();

    let (status, _) = app
        .put(
            &format!("/api/invoices/{}/payments/{}", invoice_id, first),
            json!({"amount": 120_000, "paymentDate": "2024-01-10", "paymentType": "Cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, booking) = app
        .get(&format!("/api/bookings/{}", booking["_id"].as_str().unwrap()))
        .await;
    assert_eq!(booking["firstPayment"].as_f64(), Some(120_000.0));
}

#[tokio::test]
async fn payments_may_not_exceed_total_cost() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();
    app.add_payment(invoice_id, 400_000).await;

    let (status, body) = app
        .post(
            &format!("/api/invoices/{}/add-payment", invoice_id),
            json!({"amount": 1, "paymentType": "Cash"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "amount");

    let (_, invoice) = app.get(&format!("/api/invoices/{}", invoice_id)).await;
    assert_eq!(invoice["balance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn stale_expected_version_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, invoice) = app.create_booking(1, 100_000).await;
    let invoice_id = invoice["_id"].as_str().unwrap();

    let updated = app.add_payment(invoice_id, 10_000).await;
    assert_eq!(updated["version"], 1);

    let (status, body) = app
        .post(
            &format!("/api/invoices/{}/add-payment", invoice_id),
            json!({"amount": 5_000, "paymentType": "Cash", "expectedVersion": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let second = payment_ids(&updated)[1].clone();
    let (status, _) = app
        .delete(&format!(
            "/api/invoices/{}/payments/{}?expectedVersion=0",
            invoice_id, second
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .delete(&format!(
            "/api/invoices/{}/payments/{}?expectedVersion=1",
            invoice_id, second
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);
}

#[tokio::test]
async fn invoices_are_listed_per_booking() {
    let app = TestApp::spawn().await;
    let (first, _) = app.create_booking(1, 100_000).await;
    app.create_booking(2, 50_000).await;

    let (_, all) = app.get("/api/invoices").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let booking_id = first["_id"].as_str().unwrap();
    let (_, filtered) = app
        .get(&format!("/api/invoices?bookingId={}", booking_id))
        .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["bookingId"], booking_id);
}

#[tokio::test]
async fn second_invoice_for_a_booking_conflicts() {
    let app = TestApp::spawn().await;
    let (booking, _) = app.create_booking(1, 100_000).await;

    let (status, _) = app
        .post("/api/invoices", json!({"bookingId": booking["_id"]}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/invoices", json!({"bookingId": "no-such-booking"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoices_require_authentication() {
    let app = TestApp::spawn().await;
    let (status, body) = app.request(Method::GET, "/api/invoices", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}
