use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use contract::{
    ApiResponse, HealthResponse, LoginRequest, LoginResponse, SignUpRequest, SignUpResponse,
};

use crate::{
    auth::AuthUser,
    error::AppError,
    state::AppState,
    utils::{ensure_valid, parse_payload},
};

pub const APPLICATION: &str = "standard-board-rts-backend";

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        application: APPLICATION.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn sign_up_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = parse_payload(payload)?;
    ensure_valid(request.validate())?;

    let user = state.auth.sign_up(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SignUpResponse::from(&user))),
    ))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = parse_payload(payload)?;
    ensure_valid(request.validate())?;

    let user = state.auth.login(&request).await?;
    let access_token = state
        .tokens
        .generate_token(user.id, &user.email, user.role)
        .map_err(AppError::internal)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(LoginResponse {
            access_token,
            user_id: user.id,
            email: user.email,
            nickname: user.nickname,
            role: user.role,
        })),
    ))
}

pub async fn me_handler(Extension(AuthUser(user)): Extension<AuthUser>) -> impl IntoResponse {
    Json(ApiResponse::success(SignUpResponse::from(&user)))
}

pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed
}
