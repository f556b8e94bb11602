//! Remote API configuration from environment variables.
//!
//! `STOREFRONT_API_URL` names the backend base URL (every endpoint path is appended
//! to it) and `STOREFRONT_HTTP_TIMEOUT_SECS` overrides the transport timeout.

use crate::errors::{Error, Result};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the storefront backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Builds a config, normalising the base URL.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            timeout,
        }
    }

    /// Reads the config from the environment, falling back to local defaults.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout = parse_timeout(std::env::var("STOREFRONT_HTTP_TIMEOUT_SECS").ok().as_deref())?;
        Ok(Self::new(&base_url, timeout))
    }
}

/// Strips surrounding whitespace and trailing slashes from a base URL.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Parses a timeout in whole seconds; `None` yields the default.
pub fn parse_timeout(raw: Option<&str>) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    let secs: u64 = raw.trim().parse().map_err(|e| Error::Config {
        message: format!("STOREFRONT_HTTP_TIMEOUT_SECS must be a whole number of seconds: {e}"),
    })?;
    if secs == 0 {
        return Err(Error::Config {
            message: "STOREFRONT_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
