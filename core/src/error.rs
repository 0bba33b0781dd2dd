use std::fmt;
use thiserror::Error;

/// The error type for storwire operations
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    service: Option<ServiceErrorDetail>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials exist but are invalid/malformed
    CredentialInvalid,

    /// Request cannot be built (empty names, out of range values, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Connection failures, resets and timeouts reported by the transport
    Transport,

    /// Service answered with a status outside the operation's success range
    Service,

    /// Response content type differs from the one the response shape requires
    ContentTypeMismatch,

    /// Response headers or body could not be parsed into the response shape
    Parse,

    /// Unexpected errors
    Unexpected,
}

/// Status, error code and message carried by a service failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceErrorDetail {
    /// HTTP status code returned by the service.
    pub status: http::StatusCode,
    /// Service specific error code, such as `BlobNotFound`.
    pub code: String,
    /// Human readable message returned by the service.
    pub message: String,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            service: None,
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the service detail if this error comes from a non-success response.
    pub fn service_detail(&self) -> Option<&ServiceErrorDetail> {
        self.service.as_ref()
    }

    /// Check if this error is expected to go away when the request is sent again.
    ///
    /// Transport failures and 5xx service responses are temporary. Everything else,
    /// including 4xx responses and validation failures, is permanent.
    pub fn is_temporary(&self) -> bool {
        match self.kind {
            ErrorKind::Transport => true,
            ErrorKind::Service => self
                .service
                .as_ref()
                .is_some_and(|v| v.status.is_server_error()),
            _ => false,
        }
    }
}

// Convenience constructors
impl Error {
    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a service error from a parsed error document.
    pub fn service(detail: ServiceErrorDetail) -> Self {
        let message = format!(
            "service responded {} with code {}: {}",
            detail.status.as_u16(),
            detail.code,
            detail.message
        );
        Self {
            kind: ErrorKind::Service,
            message,
            service: Some(detail),
            source: None,
        }
    }

    /// Create a content type mismatch error
    pub fn content_type_mismatch(expected: &str, actual: Option<&str>) -> Self {
        Self::new(
            ErrorKind::ContentTypeMismatch,
            format!(
                "expected content type {expected}, got {}",
                actual.unwrap_or("none")
            ),
        )
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Transport => write!(f, "transport failure"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::ContentTypeMismatch => write!(f, "unexpected content type"),
            ErrorKind::Parse => write!(f, "response parse failure"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::parse(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
