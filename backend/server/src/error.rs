use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contract::ApiResponse;
use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, service::AuthError, token::TokenError, user::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    pub fn internal(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::InternalError(Box::new(error))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MalformedPayload => (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Auth(AuthError::DuplicateEmail) => (StatusCode::BAD_REQUEST, "DUPLICATE_EMAIL"),
            AppError::Auth(AuthError::DuplicateNickname) => {
                (StatusCode::BAD_REQUEST, "DUPLICATE_NICKNAME")
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS")
            }
            AppError::Unauthorized | AppError::Auth(AuthError::UserNotFound(_)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            AppError::Auth(AuthError::Store(_) | AuthError::Password(_))
            | AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match (&self, status) {
            (_, StatusCode::INTERNAL_SERVER_ERROR) => {
                error!("{self}");
                "Internal server error".to_string()
            }
            (AppError::Auth(AuthError::UserNotFound(_)), _) => {
                AppError::Unauthorized.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(code, message))).into_response()
    }
}

/// Anything that stops the server from coming up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
