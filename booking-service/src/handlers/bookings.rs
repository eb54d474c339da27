use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use super::{multipart_error, read_file};
use crate::{
    dtos::{
        bookings::{
            BookingDocumentUpload, CreateBookingRequest, CreateBookingResponse,
            UpdateBookingRequest,
        },
        LayoutQuery,
    },
    middleware::AuthUser,
    models::DocumentKind,
    utils::ValidatedJson,
    AppState,
};

/// A new booking as posted by the SPA: either a plain JSON body, or a
/// multipart form with the JSON in a `booking` part and identity documents
/// in parts named after their kind.
pub struct BookingSubmission {
    pub booking: CreateBookingRequest,
    pub documents: Vec<BookingDocumentUpload>,
}

#[axum::async_trait]
impl<S> FromRequest<S> for BookingSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let ValidatedJson(booking) =
                ValidatedJson::<CreateBookingRequest>::from_request(req, state).await?;
            return Ok(Self {
                booking,
                documents: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        let mut booking: Option<CreateBookingRequest> = None;
        let mut documents = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "booking" {
                let text = field.text().await.map_err(multipart_error)?;
                let parsed = serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Invalid booking JSON: {}", e))
                })?;
                booking = Some(parsed);
            } else if let Some(kind) = DocumentKind::from_field_name(&name) {
                documents.push(BookingDocumentUpload {
                    kind,
                    file: read_file(field).await?,
                });
            } else {
                tracing::debug!(field = %name, "Ignoring unexpected multipart field");
            }
        }

        let booking = booking.ok_or_else(|| {
            AppError::invalid_field("booking", "Booking details are required")
        })?;
        booking.validate()?;

        Ok(Self { booking, documents })
    }
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.list(query.layout.as_deref()).await?))
}

pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    submission: BookingSubmission,
) -> Result<impl IntoResponse, AppError> {
    let (booking, statement) = state
        .bookings
        .create(submission.booking, submission.documents)
        .await?;

    tracing::info!(booking_id = %booking.id, created_by = %claims.sub, "Booking created");

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking,
            invoice: statement.into(),
        }),
    ))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.get(&id).await?))
}

pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.update(&id, req).await?))
}

/// Archives the buyer, then removes the booking and its invoice. Returns
/// the archive entry.
pub async fn delete_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let archived = state.bookings.delete(&id, &claims.sub).await?;
    Ok(Json(archived))
}

/// Attaches every identity document part in the form, replacing any
/// earlier file of the same kind.
pub async fn upload_booking_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(kind) = DocumentKind::from_field_name(&name) else {
            tracing::debug!(field = %name, "Ignoring unexpected multipart field");
            continue;
        };
        let upload = BookingDocumentUpload {
            kind,
            file: read_file(field).await?,
        };
        booking = Some(state.bookings.upload_document(&id, upload).await?);
    }

    let booking = booking.ok_or_else(|| {
        AppError::invalid_field(
            "file",
            "Attach at least one of aadharCardFront, aadharCardBack or panCard",
        )
    })?;
    Ok(Json(booking))
}
