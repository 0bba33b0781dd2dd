use http::{HeaderMap, HeaderValue, StatusCode};
use storwire_core::time::{format_http_date, DateTime};
use storwire_core::{Result, ServiceErrorDetail, ServiceProtocol};

use crate::constants::*;
use crate::error::parse_error_response;

/// AzureProtocol stamps `x-ms-date` and `x-ms-version` on every attempt and
/// understands the service error documents.
#[derive(Debug, Clone)]
pub struct AzureProtocol {
    version: String,
}

impl Default for AzureProtocol {
    fn default() -> Self {
        Self {
            version: AZURE_VERSION.to_string(),
        }
    }
}

impl AzureProtocol {
    /// Create a protocol speaking the default service version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Speak another service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Get the service version sent as `x-ms-version`.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl ServiceProtocol for AzureProtocol {
    fn protocol_headers(&self, headers: &mut HeaderMap, now: DateTime) -> Result<()> {
        headers.insert(X_MS_DATE, format_http_date(now).parse()?);
        headers.insert(X_MS_VERSION, HeaderValue::from_str(&self.version)?);
        Ok(())
    }

    fn parse_error(&self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ServiceErrorDetail {
        parse_error_response(status, headers, body)
    }
}
