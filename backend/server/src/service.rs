use std::sync::Arc;

use contract::{LoginRequest, Role, SignUpRequest};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    password::{PasswordEncoder, PasswordError},
    user::{NewUser, StoreError, User, UserStore},
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email is already in use.")]
    DuplicateEmail,

    #[error("Nickname is already in use.")]
    DuplicateNickname,

    #[error("Email or password does not match.")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::DuplicateNickname => AuthError::DuplicateNickname,
            other => AuthError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    passwords: PasswordEncoder,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, passwords: PasswordEncoder) -> Self {
        Self { users, passwords }
    }

    /// Expects a request that already passed validation.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<User, AuthError> {
        if self.users.exists_by_email(&request.email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.users.exists_by_nickname(&request.nickname).await? {
            return Err(AuthError::DuplicateNickname);
        }

        let password_hash = self.passwords.encode(&request.password).await?;

        // The store re-checks both keys, the checks above only spare a hash on the common path.
        let user = self
            .users
            .save(NewUser {
                email: request.email.clone(),
                password_hash,
                nickname: request.nickname.clone(),
                role: Role::User,
            })
            .await?;

        info!("Registered user {} ({})", user.id, user.nickname);

        Ok(user)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<User, AuthError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.matches(&request.password, &user.password_hash).await {
            debug!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn load_user(&self, email: &str) -> Result<User, AuthError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(email.to_string()))
    }
}
