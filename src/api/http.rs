//! HTTP transport for the storefront backend, built on [`reqwest`].
//!
//! The backend authenticates with a session cookie, so the client keeps a cookie
//! store and every request carries whatever cookies the server has set.

use crate::api::transport::{ApiResponse, Transport};
use crate::config::api::ApiConfig;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Cookie-carrying HTTP client for one backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with its own cookie store.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Full URL for an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| Error::network(&e))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| {
                debug!(status, "Response body is not JSON");
                Value::Null
            })
        };
        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::network(&e))?;
        Self::read(response).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::network(&e))?;
        Self::read(response).await
    }
}
