use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::{
    API_PREFIX, AUTH_PREFIX,
    envelope::ApiResponse,
    payloads::{LoginRequest, LoginResponse, SignUpRequest, SignUpResponse},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message}")]
    Api { code: String, message: String },

    #[error("HTTP error: {0}")]
    Status(StatusCode),

    #[error("Response carried no data")]
    MissingData,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Thin wrapper over the `/api/v1/auth` endpoints.
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, ClientError> {
        self.post_api("/signup", request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.post_api("/login", request).await
    }

    pub async fn me(&self, access_token: &str) -> Result<SignUpResponse, ClientError> {
        let response = self
            .http
            .get(format!("{}{API_PREFIX}/users/me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        unwrap_envelope(response).await
    }

    async fn post_api<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{AUTH_PREFIX}{endpoint}", self.base_url);
        debug!("POST {url}");

        let response = self.http.post(url).json(body).send().await?;

        unwrap_envelope(response).await
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let result: ApiResponse<T> = match response.json().await {
        Ok(result) => result,
        Err(_) if !status.is_success() => return Err(ClientError::Status(status)),
        Err(e) => return Err(e.into()),
    };

    if !result.success {
        let (code, message) = match result.error {
            Some(e) if !e.message.is_empty() => (e.code, e.message),
            Some(e) => (e.code, UNKNOWN_ERROR.to_string()),
            None => (String::new(), UNKNOWN_ERROR.to_string()),
        };

        return Err(ClientError::Api { code, message });
    }

    if !status.is_success() {
        return Err(ClientError::Status(status));
    }

    result.data.ok_or(ClientError::MissingData)
}
