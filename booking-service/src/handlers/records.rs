use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{multipart_error, read_file};
use crate::{
    dtos::{
        records::{
            CreateEnquiryRequest, LedgerEntryRequest, UpdateEnquiryRequest,
            UpdateLedgerEntryRequest,
        },
        LayoutQuery, MessageResponse,
    },
    models::DEFAULT_LAYOUT,
    utils::ValidatedJson,
    AppState,
};

// Expenses

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.list_expenses(query.layout.as_deref()).await?))
}

pub async fn create_expense(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LedgerEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let expense = state.records.create_expense(req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateLedgerEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.update_expense(&id, req).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.records.delete_expense(&id).await?;
    Ok(Json(MessageResponse::new("Expense deleted")))
}

/// Expects a single `file` part.
pub async fn upload_expense_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let file = read_file(field).await?;
            return Ok(Json(state.records.attach_expense_document(&id, file).await?));
        }
    }
    Err(AppError::invalid_field("file", "No file uploaded"))
}

/// Streams an attached expense document back by its stored file name.
pub async fn download_expense_document(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (document, data) = state.records.expense_document(&file_name).await?;

    let content_type = HeaderValue::from_str(&document.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "inline; filename=\"{}\"",
        document.file_name.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

pub async fn delete_expense_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.remove_expense_document(&id).await?))
}

// Others

pub async fn list_others(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.list_others(query.layout.as_deref()).await?))
}

pub async fn create_other(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LedgerEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let other = state.records.create_other(req).await?;
    Ok((StatusCode::CREATED, Json(other)))
}

pub async fn update_other(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateLedgerEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.update_other(&id, req).await?))
}

pub async fn delete_other(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.records.delete_other(&id).await?;
    Ok(Json(MessageResponse::new("Record deleted")))
}

// Enquiries

pub async fn list_enquiries(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state.records.list_enquiries(query.layout.as_deref()).await?,
    ))
}

pub async fn create_enquiry(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateEnquiryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let enquiry = state.records.create_enquiry(req).await?;
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub async fn update_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateEnquiryRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.records.update_enquiry(&id, req).await?))
}

pub async fn delete_enquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.records.delete_enquiry(&id).await?;
    Ok(Json(MessageResponse::new("Enquiry deleted")))
}

// Layout resources

pub async fn list_layout_resources(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state
            .records
            .list_layout_resources(query.layout.as_deref())
            .await?,
    ))
}

/// Multipart form with `layout`, `title` and `file` parts.
pub async fn create_layout_resource(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut layout = None;
    let mut title = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("layout") => layout = Some(field.text().await.map_err(multipart_error)?),
            Some("title") => title = Some(field.text().await.map_err(multipart_error)?),
            Some("file") => file = Some(read_file(field).await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::invalid_field("file", "No file uploaded"))?;
    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file.file_name.clone());
    let layout = layout
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

    let resource = state
        .records
        .create_layout_resource(layout, title, file)
        .await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn delete_layout_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.records.delete_layout_resource(&id).await?;
    Ok(Json(MessageResponse::new("Layout resource deleted")))
}
