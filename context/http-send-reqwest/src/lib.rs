//! Reqwest-based transport for storwire.
//!
//! `ReqwestHttpSend` implements [`HttpSend`] on top of a [`reqwest::Client`].
//! Timeouts, connection failures and body read failures are reported as
//! transport errors, which the pipeline's retry policy treats as transient.
//!
//! ```no_run
//! use std::time::Duration;
//! use storwire_core::Context;
//! use storwire_http_send_reqwest::ReqwestHttpSend;
//!
//! # fn example() -> storwire_core::Result<()> {
//! // Every attempt gets at most 30 seconds.
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::with_timeout(Duration::from_secs(30))?);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};
use storwire_core::{Error, HttpSend, Result};

/// HttpSend implementation backed by reqwest.
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a new ReqwestHttpSend whose client enforces a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config_invalid("failed to build reqwest client").with_source(e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to convert request").with_source(e))?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(map_reqwest_error)?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(map_reqwest_error)?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    debug!("reqwest failed: {err:?}");
    if err.is_builder() {
        Error::request_invalid("failed to build request").with_source(err)
    } else if err.is_timeout() {
        Error::transport("request timed out").with_source(err)
    } else {
        Error::transport("failed to send request").with_source(err)
    }
}
