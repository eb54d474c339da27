use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        brokers::{CreateBrokerRequest, UpdateBrokerRequest},
        MessageResponse,
    },
    utils::ValidatedJson,
    AppState,
};

pub async fn list_brokers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.brokers.list().await?))
}

pub async fn create_broker(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateBrokerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let broker = state.brokers.create(req).await?;
    Ok((StatusCode::CREATED, Json(broker)))
}

pub async fn get_broker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.brokers.get(&id).await?))
}

pub async fn update_broker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBrokerRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.brokers.update(&id, req).await?))
}

pub async fn delete_broker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.brokers.delete(&id).await?;
    Ok(Json(MessageResponse::new("Broker deleted")))
}

/// Commission owed to the broker across the bookings they referred.
pub async fn broker_financials(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.brokers.financials(&id).await?))
}
