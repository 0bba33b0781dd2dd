//! Capability traits that plug request and response shapes into the pipeline.
//!
//! An operation implements [`Operation`] and overrides only the capabilities it
//! needs; the defaults mean "capability absent". The response shape implements
//! [`ReceiveResponse`] the same way.

use bytes::Bytes;
use http::header::HeaderName;
use http::{Extensions, HeaderMap, Method, StatusCode};

use crate::{Result, UriBuilder};

/// Operation describes one logical storage request.
///
/// The pipeline borrows it immutably and may invoke every method once per
/// attempt, so implementations must return the same values on every call.
pub trait Operation: Send + Sync {
    /// Response shape produced by this operation.
    type Output: ReceiveResponse;

    /// HTTP method of this operation.
    fn method(&self) -> Method;

    /// Endpoint root, path segments and query of this operation.
    fn uri(&self) -> UriBuilder;

    /// Status codes that count as success. Defaults to the 2xx range.
    fn is_success(&self, status: StatusCode) -> bool {
        status.is_success()
    }

    /// Sends required headers: applied unconditionally.
    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let _ = headers;
        Ok(())
    }

    /// Sends optional headers: only the `Some` values are applied.
    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        Vec::new()
    }

    /// Sends body: the bytes to upload. Their length becomes `content-length`.
    fn body(&self) -> Option<Bytes> {
        None
    }

    /// Request extensions made available to the request signer.
    fn extensions(&self, extensions: &mut Extensions) {
        let _ = extensions;
    }
}

/// ReceiveResponse is implemented by every response shape.
pub trait ReceiveResponse: Default + Send {
    /// Whether this shape expects a response body.
    ///
    /// When `false`, [`ReceiveResponse::receive_body`] is never invoked, even if
    /// the transport returned bytes.
    const EXPECTS_BODY: bool = false;

    /// Content type the body must carry, if the shape requires one.
    fn expected_content_type() -> Option<&'static str> {
        None
    }

    /// Receives headers: extract whatever fields this shape cares about.
    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        let _ = headers;
        Ok(())
    }

    /// Receives body: parse and store the payload.
    fn receive_body(&mut self, body: Bytes, content_type: Option<&str>) -> Result<()> {
        let _ = (body, content_type);
        Ok(())
    }
}

/// Response shape for operations that only care about success.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmptyResponse;

impl ReceiveResponse for EmptyResponse {}

/// Read a header as string, `None` if absent or not visible ascii.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
