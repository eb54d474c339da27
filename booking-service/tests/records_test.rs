mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use common::{Part, TestApp};
use serde_json::json;

const PDF: &[u8] = b"%PDF-1.4 expense receipt";

#[tokio::test]
async fn expense_net_amount_deducts_tds() {
    let app = TestApp::spawn().await;
    let (status, expense) = app
        .post(
            "/api/expenses",
            json!({
                "description": "Road levelling",
                "category": "Civil work",
                "amount": 20000,
                "tds": 2,
                "date": "2024-03-05"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", expense);
    assert_eq!(expense["netAmount"].as_f64(), Some(19_600.0));
    assert_eq!(expense["layout"], "layout1");

    let (status, updated) = app
        .put(
            &format!("/api/expenses/{}", expense["_id"].as_str().unwrap()),
            json!({"amount": 30000}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["netAmount"].as_f64(), Some(29_400.0));
}

#[tokio::test]
async fn expense_without_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .post(
            "/api/expenses",
            json!({"description": "Fencing", "category": "Civil work"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "amount");
}

#[tokio::test]
async fn expense_document_upload_download_and_removal() {
    let app = TestApp::spawn().await;
    let (_, expense) = app
        .post(
            "/api/expenses",
            json!({"description": "Survey", "category": "Fees", "amount": 5000}),
        )
        .await;
    let id = expense["_id"].as_str().unwrap();

    let request = app.multipart_request(
        &format!("/api/expenses/{}/upload", id),
        &app.admin_token,
        &[Part::File {
            name: "file",
            file_name: "receipt.pdf",
            content_type: "application/pdf",
            data: PDF,
        }],
    );
    let (status, attached) = app.send(request).await;
    assert_eq!(status, StatusCode::OK, "{}", attached);
    assert_eq!(attached["document"]["fileName"], "receipt.pdf");
    assert_eq!(
        attached["document"]["url"],
        format!("/uploads/expenses/{}.pdf", id)
    );

    let download = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/expenses/{}.pdf", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", app.admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.send_raw(download).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PDF);

    let (status, cleared) = app
        .delete(&format!("/api/expenses/{}/document", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["document"].is_null());
    assert!(!app.uploads.path().join(format!("expenses/{}.pdf", id)).exists());

    let (status, _) = app.get(&format!("/api/expenses/{}.pdf", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, expense) = app
        .post(
            "/api/expenses",
            json!({"description": "Survey", "category": "Fees", "amount": 5000}),
        )
        .await;

    let request = app.multipart_request(
        &format!("/api/expenses/{}/upload", expense["_id"].as_str().unwrap()),
        &app.admin_token,
        &[Part::Text("note", "nothing attached")],
    );
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "file");
}

#[tokio::test]
async fn others_crud() {
    let app = TestApp::spawn().await;
    let (status, other) = app
        .post(
            "/api/others",
            json!({
                "description": "Temple donation",
                "category": "Donation",
                "amount": 11000,
                "layout": "layout2"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(other["tds"].as_f64(), Some(0.0));
    assert_eq!(other["netAmount"].as_f64(), Some(11_000.0));
    let uri = format!("/api/others/{}", other["_id"].as_str().unwrap());

    let (_, listed) = app.get("/api/others?layout=layout2").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, listed) = app.get("/api/others?layout=layout1").await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, updated) = app.put(&uri, json!({"description": "Festival"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Festival");

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enquiries_validate_contact_details() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/enquiries",
            json!({"name": "Kiran", "phone": "98765", "message": "Corner plot?"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "phone");

    let (status, enquiry) = app
        .post(
            "/api/enquiries",
            json!({"name": "Kiran", "phone": "9876501234", "message": "Corner plot?"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", enquiry);
    assert_eq!(enquiry["status"], "open");

    let (status, updated) = app
        .put(
            &format!("/api/enquiries/{}", enquiry["_id"].as_str().unwrap()),
            json!({"status": "closed", "followUpDate": "2024-04-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "closed");
    assert_eq!(updated["followUpDate"], "2024-04-01");
}

#[tokio::test]
async fn layout_resource_lifecycle_removes_file() {
    let app = TestApp::spawn().await;

    let request = app.multipart_request(
        "/api/layout-resources",
        &app.admin_token,
        &[
            Part::Text("layout", "layout2"),
            Part::Text("title", "Master plan"),
            Part::File {
                name: "file",
                file_name: "plan.png",
                content_type: "image/png",
                data: b"\x89PNG master plan",
            },
        ],
    );
    let (status, resource) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED, "{}", resource);
    assert_eq!(resource["title"], "Master plan");
    assert_eq!(resource["layout"], "layout2");

    let key = resource["file"]["storageKey"].as_str().unwrap().to_string();
    assert!(key.starts_with("layouts/"));
    assert!(app.uploads.path().join(&key).exists());

    let (_, listed) = app.get("/api/layout-resources?layout=layout2").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .delete(&format!(
            "/api/layout-resources/{}",
            resource["_id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.uploads.path().join(&key).exists());

    let (_, listed) = app.get("/api/layout-resources").await;
    assert!(listed.as_array().unwrap().is_empty());
}
