use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Sends credentialed requests to the storefront backend.
///
/// Implementations return `Err` only when no HTTP response was obtained
/// (network failure); every status code, including 4xx/5xx, comes back as an
/// [`ApiResponse`] for the caller to classify.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {base}{path}`
    async fn get(&self, path: &str) -> Result<ApiResponse>;

    /// `POST {base}{path}` with a JSON body
    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse>;
}

/// Status code plus decoded JSON body (`Value::Null` when empty or not JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response envelope `{ success, message?, data? }`
    pub body: Value,
}

impl ApiResponse {
    /// Builds a response from a status and body.
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 2xx status.
    #[must_use]
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 status.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// The envelope's `success` flag, if present.
    #[must_use]
    pub fn success_flag(&self) -> Option<bool> {
        self.body.get("success").and_then(Value::as_bool)
    }

    /// Server-supplied user-facing message, if present and non-empty.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    /// The envelope's `data` field, `None` when absent or null.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.body.get("data").filter(|d| !d.is_null())
    }

    /// Classifies the response: 401 becomes [`Error::AuthenticationRequired`],
    /// any other non-2xx or an explicit `success: false` becomes [`Error::Api`]
    /// carrying the server message or `fallback`.
    pub fn ensure_success(self, fallback: &str) -> Result<Self> {
        if self.is_unauthorized() {
            return Err(Error::AuthenticationRequired);
        }
        if !self.is_success_status() || self.success_flag() == Some(false) {
            return Err(Error::Api {
                status: self.status,
                message: self.message().unwrap_or(fallback).to_string(),
            });
        }
        Ok(self)
    }

    /// `data.count`, zero when missing.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.data()
            .and_then(|d| d.get("count"))
            .and_then(Value::as_u64)
            .map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX))
    }

    /// Decodes `data` as a list, empty when missing.
    pub fn data_list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        match self.data() {
            Some(data) => Ok(serde_json::from_value(data.clone())?),
            None => Ok(Vec::new()),
        }
    }
}
