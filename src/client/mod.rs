//! Typed HTTP client for the service, plus the dashboard state that sits on
//! top of it.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    auth::dto::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
    error::ErrorBody,
    images::dto::{GenerateResponse, ImagesResponse},
};

mod dashboard;

pub use dashboard::Dashboard;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },

    #[error("not logged in")]
    NotLoggedIn,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        send(self.client.post(self.url("/api/auth/register")).json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        send(self.client.post(self.url("/api/auth/login")).json(&body)).await
    }

    pub async fn me(&self, token: &str) -> Result<MeResponse, ClientError> {
        send(self.client.get(self.url("/api/auth/me")).bearer_auth(token)).await
    }

    pub async fn images(&self, token: &str) -> Result<ImagesResponse, ClientError> {
        send(self.client.get(self.url("/api/images")).bearer_auth(token)).await
    }

    pub async fn generate(&self, token: &str, prompt: &str) -> Result<GenerateResponse, ClientError> {
        send(
            self.client
                .post(self.url("/api/generate"))
                .bearer_auth(token)
                .json(&serde_json::json!({ "prompt": prompt })),
        )
        .await
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let response = req.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    debug!(%status, %message, "api error");
    Err(ClientError::Api { status, message })
}
