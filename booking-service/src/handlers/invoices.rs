use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::invoices::{
        CreateInvoiceRequest, InvoiceQuery, InvoiceResponse, PaymentRequest, VersionQuery,
    },
    utils::ValidatedJson,
    AppState,
};

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> Result<impl IntoResponse, AppError> {
    let invoices: Vec<InvoiceResponse> = state
        .invoices
        .list(query.booking_id.as_deref())
        .await?
        .into_iter()
        .map(InvoiceResponse::from)
        .collect();
    Ok(Json(invoices))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let statement = state.invoices.create(&req.booking_id).await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(statement))))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(InvoiceResponse::from(state.invoices.get(&id).await?)))
}

/// Appends a payment, or edits the one named by `paymentId` in the body.
pub async fn add_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(mut req): ValidatedJson<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment_id = req.payment_id.take();
    let statement = state
        .invoices
        .add_or_edit_payment(&id, req, payment_id.as_deref())
        .await?;
    Ok(Json(InvoiceResponse::from(statement)))
}

pub async fn edit_payment(
    State(state): State<AppState>,
    Path((id, payment_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let statement = state
        .invoices
        .add_or_edit_payment(&id, req, Some(&payment_id))
        .await?;
    Ok(Json(InvoiceResponse::from(statement)))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    Path((id, payment_id)): Path<(String, String)>,
    Query(query): Query<VersionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let statement = state
        .invoices
        .delete_payment(&id, &payment_id, query.expected_version)
        .await?;
    Ok(Json(InvoiceResponse::from(statement)))
}
