use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::{
    error::AppError, service::AuthError, state::AppState, user::User, utils::bearer_token,
};

/// The account behind a verified bearer token, set by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let claims = state
        .tokens
        .verified_claims(token)
        .ok_or(AppError::Unauthorized)?;

    let user = state.auth.load_user(&claims.sub).await.map_err(|e| match e {
        AuthError::UserNotFound(email) => {
            error!("Token subject {email} no longer exists");
            AppError::Unauthorized
        }
        other => other.into(),
    })?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}
