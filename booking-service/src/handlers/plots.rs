use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        plots::{CreatePlotRequest, UpdatePlotRequest},
        LayoutQuery, MessageResponse,
    },
    middleware::SuperAdmin,
    utils::ValidatedJson,
    AppState,
};

pub async fn list_plots(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plots.list(query.layout.as_deref()).await?))
}

pub async fn create_plot(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    ValidatedJson(req): ValidatedJson<CreatePlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plot = state.plots.create(req).await?;
    Ok((StatusCode::CREATED, Json(plot)))
}

pub async fn get_plot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plots.get(&id).await?))
}

pub async fn update_plot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.plots.update(&id, req).await?))
}

pub async fn delete_plot(
    State(state): State<AppState>,
    _admin: SuperAdmin,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.plots.delete(&id).await?;
    Ok(Json(MessageResponse::new("Plot deleted")))
}
