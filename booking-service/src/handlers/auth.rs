use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{CreateUserRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest},
        MessageResponse,
    },
    middleware::{AuthUser, SuperAdmin},
    utils::ValidatedJson,
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth.login(&req.email, req.password).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.auth.me(&claims.sub).await?))
}

/// Always answers the same way so addresses cannot be probed.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.forgot_password(&req.email).await?;
    Ok(Json(MessageResponse::new(
        "If your email is registered, you will receive a password reset link shortly.",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.reset_password(&token, req.password).await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

pub async fn create_user(
    State(state): State<AppState>,
    SuperAdmin(claims): SuperAdmin,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.create_user(req).await?;
    tracing::info!(created_by = %claims.sub, user_id = %user.id, "User account created");
    Ok((StatusCode::CREATED, Json(user)))
}
