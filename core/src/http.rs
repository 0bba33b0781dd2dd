use crate::{Error, Result};
use bytes::Bytes;
use std::fmt::Debug;

/// HttpSend is the transport used by the pipeline to exchange one request.
///
/// Implementations must report connection failures, resets and timeouts as
/// [`ErrorKind::Transport`](crate::ErrorKind::Transport) so that the retry policy
/// can tell them apart from failures that will never succeed.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// NoopHttpSend fails every request; used until a real transport is configured.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::unexpected(
            "http sending is not supported, please configure a HttpSend in Context",
        ))
    }
}
