//! Typed wrappers around the forum backend's REST API.
//!
//! Every call is independent and stateless: the client attaches the bearer
//! token when one is present, serializes the body, and normalizes the
//! backend's `{success, data, error}` envelope into `Result<T, ApiError>`.
//! No retries, no request deduplication, no caching.

pub mod admin;
pub mod auth;
pub mod error;
pub mod notifications;
pub mod posts;
pub mod threads;

pub use error::ApiError;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use agora_types::api::ApiEnvelope;

/// Handle on the backend REST API, scoped to one request's credentials.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Attach a bearer token for authenticated endpoints.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    /// Bail before the wire when an authenticated endpoint has no token.
    fn require_token(&self) -> Result<(), ApiError> {
        if self.token.is_none() {
            return Err(ApiError::AuthRequired);
        }
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!("{} -> {}", path, status);

        match status {
            StatusCode::UNAUTHORIZED => return Err(ApiError::AuthRequired),
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound),
            s if !s.is_success() => {
                // Pull the backend's message out of the envelope if it sent one
                let message = resp
                    .json::<ApiEnvelope<serde_json::Value>>()
                    .await
                    .ok()
                    .and_then(|env| env.error)
                    .unwrap_or_else(|| format!("backend returned {s}"));
                return Err(ApiError::failed(Some(s), message));
            }
            _ => {}
        }

        let envelope: ApiEnvelope<T> = resp.json().await?;
        if !envelope.success {
            let message = envelope.error.unwrap_or_else(|| "request rejected".into());
            return Err(ApiError::failed(Some(status), message));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::failed(Some(status), "response envelope carried no data"))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), path).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body), path).await
    }

    pub(crate) async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::PATCH, path).json(body), path).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, path), path).await
    }
}
