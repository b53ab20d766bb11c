//! Token issuance collaborator.
//!
//! Credentials are checked and tokens minted by the identity service; the
//! gateway only forwards `tokenAuth` and `refreshToken` to it over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected identity service response: {0}")]
    Protocol(String),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::InvalidCredentials => "UNAUTHENTICATED",
            IdentityError::Unavailable(_) | IdentityError::Protocol(_) => "INTERNAL",
        }
    }

    pub fn is_user_facing(&self) -> bool {
        matches!(self, IdentityError::InvalidCredentials)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn token_auth(&self, email: &str, password: &str) -> Result<IssuedToken, IdentityError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<IssuedToken, IdentityError>;
}

#[derive(Serialize)]
struct TokenAuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// JSON-over-HTTP client for the identity service
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_for_token<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<IssuedToken, IdentityError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            warn!(%url, %status, "identity service returned an error");
            return Err(IdentityError::Unavailable(format!("status {}", status)));
        }

        response
            .json::<IssuedToken>()
            .await
            .map_err(|e| IdentityError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn token_auth(&self, email: &str, password: &str) -> Result<IssuedToken, IdentityError> {
        let token = self
            .post_for_token("/api/v1/auth/token", &TokenAuthRequest { email, password })
            .await?;
        info!("token issued");
        Ok(token)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<IssuedToken, IdentityError> {
        self.post_for_token("/api/v1/auth/refresh", &RefreshRequest { refresh_token })
            .await
    }
}
