//! The request execution pipeline.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use log::debug;

use crate::operation::header_str;
use crate::time::{now, DateTime};
use crate::{
    Context, Error, ErrorKind, Operation, ReceiveResponse, Result, RetryPolicy, ServiceErrorDetail,
    Signer, SigningCredential,
};

/// ServiceProtocol carries the parts of the wire protocol that every request shares.
pub trait ServiceProtocol: Debug + Send + Sync + 'static {
    /// Insert the headers the protocol mandates on every request, such as date and
    /// version. Called once per attempt with the attempt's signing time.
    fn protocol_headers(&self, headers: &mut HeaderMap, now: DateTime) -> Result<()>;

    /// Turn a non-success response into status, error code and message.
    ///
    /// Must not fail: unparsable documents produce placeholder values.
    fn parse_error(&self, status: StatusCode, headers: &HeaderMap, body: &[u8])
        -> ServiceErrorDetail;
}

/// Pipeline executes one logical storage operation and produces one typed outcome.
///
/// Each attempt rebuilds the uri, headers, body and signature from the operation,
/// so time-sensitive values are fresh whenever the retry policy tries again.
#[derive(Debug, Clone)]
pub struct Pipeline<K: SigningCredential> {
    signer: Signer<K>,
    protocol: Arc<dyn ServiceProtocol>,
    retry: RetryPolicy,
}

impl<K: SigningCredential> Pipeline<K> {
    /// Create a pipeline with the default retry policy.
    pub fn new(signer: Signer<K>, protocol: impl ServiceProtocol) -> Self {
        Self {
            signer,
            protocol: Arc::new(protocol),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the context used to send requests.
    pub fn context(&self) -> &Context {
        self.signer.context()
    }

    /// Execute the operation.
    pub async fn execute<O: Operation>(&self, op: &O) -> Result<O::Output> {
        let resp = self
            .retry
            .retry(|attempt| self.send_once(op, attempt))
            .await?;

        let (parts, body) = resp.into_parts();
        let mut output = O::Output::default();
        output
            .receive_headers(&parts.headers)
            .map_err(|e| into_parse_error("receive response headers", e))?;

        if O::Output::EXPECTS_BODY {
            let content_type = header_str(&parts.headers, CONTENT_TYPE.as_str());
            if let Some(expected) = O::Output::expected_content_type() {
                if !content_type.is_some_and(|v| v.starts_with(expected)) {
                    return Err(Error::content_type_mismatch(expected, content_type));
                }
            }
            output
                .receive_body(body, content_type)
                .map_err(|e| into_parse_error("receive response body", e))?;
        }

        Ok(output)
    }

    async fn send_once<O: Operation>(&self, op: &O, attempt: usize) -> Result<http::Response<Bytes>> {
        let method = op.method();
        let uri = op.uri().build()?;
        let body = op.body();

        let (mut parts, ()) = http::Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(())?
            .into_parts();

        op.required_headers(&mut parts.headers)?;
        for (name, value) in op.optional_headers() {
            if let Some(value) = value {
                parts.headers.insert(name, value.parse::<HeaderValue>()?);
            }
        }
        self.protocol.protocol_headers(&mut parts.headers, now())?;
        match &body {
            Some(bs) => {
                parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bs.len()));
            }
            None if method == Method::PUT || method == Method::POST || method.as_str() == "MERGE" => {
                parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(0));
            }
            None => {}
        }
        op.extensions(&mut parts.extensions);

        self.signer.sign(&mut parts).await?;

        debug!("attempt {attempt}: sending {} {}", parts.method, parts.uri);
        let req = http::Request::from_parts(parts, body.unwrap_or_default());
        let resp = self.context().http_send(req).await?;

        let status = resp.status();
        if op.is_success(status) {
            debug!("attempt {attempt}: got success response {status}");
            return Ok(resp);
        }

        let detail = self
            .protocol
            .parse_error(status, resp.headers(), resp.body());
        debug!("attempt {attempt}: got error response {detail:?}");
        Err(Error::service(detail))
    }
}

fn into_parse_error(action: &str, err: Error) -> Error {
    if err.kind() == ErrorKind::Parse {
        err
    } else {
        Error::parse(format!("failed to {action}")).with_source(err)
    }
}
