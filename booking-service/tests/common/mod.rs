//! Shared harness for booking-service integration tests.
//!
//! Drives the real router in-process over the in-memory store, with uploads
//! in a temporary directory and reset emails captured by a mock provider.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use booking_service::config::{
    AuthConfig, BookingConfig, StoreBackend, StoreConfig, UploadConfig,
};
use booking_service::models::{Role, User};
use booking_service::services::{MockEmailService, Stores};
use booking_service::utils::hash_password;
use booking_service::utils::Password;
use booking_service::{build_router, AppState};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
const BOUNDARY: &str = "booking-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub stores: Stores,
    pub email: Arc<MockEmailService>,
    pub uploads: TempDir,
    pub admin_token: String,
    pub superadmin_token: String,
}

/// One part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn test_config(uploads: &TempDir) -> BookingConfig {
    BookingConfig {
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb_uri: None,
            mongodb_database: "booking_test".to_string(),
        },
        uploads: UploadConfig {
            local_path: uploads.path().to_string_lossy().into_owned(),
            max_upload_bytes: 10 * 1024 * 1024,
        },
        auth: AuthConfig {
            jwt_secret: Secret::new("integration-test-secret".to_string()),
            jwt_expiry_minutes: 60,
            admin_email: None,
            admin_password: None,
            frontend_url: "http://localhost:3000".to_string(),
            login_attempts_per_minute: 100,
        },
        smtp: None,
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let config = test_config(&uploads);

        let stores = Stores::in_memory();
        let storage = booking_service::services::LocalStorage::new(uploads.path())
            .await
            .expect("Failed to create storage");
        let email = Arc::new(MockEmailService::new());

        let state = AppState::new(
            &config,
            stores.clone(),
            Arc::new(storage),
            email.clone(),
            None,
        );
        let router = build_router(state.clone());

        // Tokens are minted directly; only the login tests pay for hashing.
        let admin = User::new(
            "admin@example.com".to_string(),
            "Office Admin".to_string(),
            "unused".to_string(),
            Role::Admin,
        );
        let superadmin = User::new(
            "owner@example.com".to_string(),
            "Owner".to_string(),
            "unused".to_string(),
            Role::Superadmin,
        );
        stores.users.insert(&admin).await.unwrap();
        stores.users.insert(&superadmin).await.unwrap();

        let admin_token = state.jwt.generate_token(&admin).unwrap();
        let superadmin_token = state.jwt.generate_token(&superadmin).unwrap();

        TestApp {
            router,
            state,
            stores,
            email,
            uploads,
            admin_token,
            superadmin_token,
        }
    }

    /// Adds a user whose password is `TEST_PASSWORD`.
    pub async fn add_user(&self, email: &str, role: Role) -> User {
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string())).unwrap();
        let user = User::new(email.to_string(), "Staff Member".to_string(), hash, role);
        self.stores.users.insert(&user).await.unwrap();
        user
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&self.admin_token), None)
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&self.admin_token), Some(body))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(&self.admin_token), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&self.admin_token), None)
            .await
    }

    pub fn multipart_request(&self, uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            name, file_name, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    /// Plot of 1000 sq-ft at 500 per sq-ft, so a full-rate booking costs 500000.
    pub async fn create_plot(&self, plot_number: u32) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/plots",
                Some(&self.superadmin_token),
                Some(json!({
                    "plotNumber": plot_number,
                    "layout": "layout1",
                    "areaSqFt": 1000,
                    "ratePerSqFt": 500
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create plot failed: {}", body);
        body
    }

    pub fn booking_body(&self, plot_id: &str, first_payment: u64) -> Value {
        json!({
            "name": "Asha Rao",
            "phone": "9876543210",
            "address": "12 MG Road, Bengaluru",
            "gender": "Female",
            "email": "asha@example.com",
            "plotId": plot_id,
            "totalCost": 500000,
            "ratePerSqFt": 500,
            "firstPayment": first_payment,
            "paymentType": "Cash",
            "bookingDate": "2024-01-10"
        })
    }

    /// Books a fresh plot; returns `(booking, invoice)`.
    pub async fn create_booking(&self, plot_number: u32, first_payment: u64) -> (Value, Value) {
        let plot = self.create_plot(plot_number).await;
        let plot_id = plot["_id"].as_str().unwrap();
        let (status, body) = self
            .post("/api/bookings", self.booking_body(plot_id, first_payment))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create booking failed: {}", body);
        (body["booking"].clone(), body["invoice"].clone())
    }

    pub async fn add_payment(&self, invoice_id: &str, amount: u64) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/invoices/{}/add-payment", invoice_id),
                json!({
                    "amount": amount,
                    "paymentDate": "2024-02-01",
                    "paymentType": "Online"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add payment failed: {}", body);
        body
    }
}

pub fn amounts(invoice: &Value) -> Vec<f64> {
    invoice["payments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["amount"].as_f64().unwrap())
        .collect()
}

pub fn payment_ids(invoice: &Value) -> Vec<String> {
    invoice["payments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}
