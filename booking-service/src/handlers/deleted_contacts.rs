use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{middleware::SuperAdmin, AppState};

pub async fn list_deleted_contacts(
    State(state): State<AppState>,
    _admin: SuperAdmin,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.archive.list().await?))
}

/// Recreates the booking and its invoice from the archive entry.
pub async fn restore_deleted_contact(
    State(state): State<AppState>,
    SuperAdmin(claims): SuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.archive.restore(&id).await?;
    tracing::info!(booking_id = %booking.id, restored_by = %claims.sub, "Booking restored from archive");
    Ok(Json(booking))
}
