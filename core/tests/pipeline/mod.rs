use std::time::Duration;

use bytes::Bytes;
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use pretty_assertions::assert_eq;
use storwire_core::operation::header_str;
use storwire_core::{
    Backoff, Context, Error, ErrorKind, Operation, Pipeline, ReceiveResponse, Result, RetryPolicy,
    Signer, UriBuilder,
};

use crate::mock::{MockHttpSend, Reply, TestCredential, TestLoader, TestProtocol, TestSigner};

fn init_pipeline(replies: Vec<Reply>) -> (MockHttpSend, Pipeline<TestCredential>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let http = MockHttpSend::new(replies);
    let ctx = Context::new().with_http_send(http.clone());
    let signer = Signer::new(ctx, TestLoader, TestSigner);
    let pipeline = Pipeline::new(signer, TestProtocol)
        .with_retry(RetryPolicy::new(3).with_backoff(Backoff::Fixed(Duration::ZERO)));
    (http, pipeline)
}

struct PutThing {
    name: String,
    body: Option<Bytes>,
    cache_control: Option<String>,
    content_language: Option<String>,
}

impl PutThing {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            body: Some(Bytes::from_static(b"hello world")),
            cache_control: Some("no-cache".to_string()),
            content_language: None,
        }
    }
}

impl Operation for PutThing {
    type Output = HeaderOnly;

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> UriBuilder {
        UriBuilder::new("https://acct.blob.example.com")
            .push_segment("container")
            .push_segment(&self.name)
            .push_query("comp", "thing")
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert("x-test-kind", HeaderValue::from_static("BlockBlob"));
        Ok(())
    }

    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        vec![
            (http::header::CACHE_CONTROL, self.cache_control.clone()),
            (http::header::CONTENT_LANGUAGE, self.content_language.clone()),
        ]
    }

    fn body(&self) -> Option<Bytes> {
        self.body.clone()
    }
}

#[derive(Debug, Default)]
struct HeaderOnly {
    etag: Option<String>,
    body_seen: bool,
}

impl ReceiveResponse for HeaderOnly {
    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.etag = header_str(headers, "etag").map(str::to_string);
        Ok(())
    }

    fn receive_body(&mut self, _: Bytes, _: Option<&str>) -> Result<()> {
        self.body_seen = true;
        Ok(())
    }
}

struct GetDoc;

impl Operation for GetDoc {
    type Output = JsonDoc;

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self) -> UriBuilder {
        UriBuilder::new("https://acct.table.example.com").push_segment("Tables")
    }
}

#[derive(Debug, Default)]
struct JsonDoc {
    body: String,
    content_type: String,
}

impl ReceiveResponse for JsonDoc {
    const EXPECTS_BODY: bool = true;

    fn expected_content_type() -> Option<&'static str> {
        Some("application/json")
    }

    fn receive_body(&mut self, body: Bytes, content_type: Option<&str>) -> Result<()> {
        self.body = String::from_utf8(body.to_vec())?;
        self.content_type = content_type.unwrap_or_default().to_string();
        Ok(())
    }
}

#[tokio::test]
async fn test_request_headers_and_body() -> Result<()> {
    let (http, pipeline) = init_pipeline(vec![Reply::Response(
        http::Response::builder()
            .status(StatusCode::CREATED)
            .header("etag", "\"0x8D\"")
            .body(Bytes::new())
            .unwrap(),
    )]);

    let out = pipeline.execute(&PutThing::new("a b")).await?;
    assert_eq!(out.etag.as_deref(), Some("\"0x8D\""));

    let reqs = http.requests();
    assert_eq!(reqs.len(), 1);
    let req = &reqs[0];
    assert_eq!(req.method(), Method::PUT);
    assert_eq!(
        req.uri().to_string(),
        "https://acct.blob.example.com/container/a%20b?comp=thing"
    );
    let headers = req.headers();
    assert_eq!(header_str(headers, "x-test-kind"), Some("BlockBlob"));
    assert_eq!(header_str(headers, "cache-control"), Some("no-cache"));
    assert!(!headers.contains_key("content-language"));
    assert_eq!(header_str(headers, "content-length"), Some("11"));
    assert_eq!(header_str(headers, "x-test-version"), Some("2024-01-01"));
    assert!(headers.contains_key("x-test-date"));
    assert!(header_str(headers, "authorization")
        .unwrap()
        .starts_with("Test secret:PUT:"));
    assert_eq!(req.body().as_ref(), b"hello world");
    Ok(())
}

#[tokio::test]
async fn test_bodiless_put_sends_zero_length() -> Result<()> {
    let (http, pipeline) = init_pipeline(vec![Reply::status(StatusCode::OK)]);

    let mut op = PutThing::new("empty");
    op.body = None;
    pipeline.execute(&op).await?;

    let reqs = http.requests();
    assert_eq!(header_str(reqs[0].headers(), "content-length"), Some("0"));
    Ok(())
}

#[tokio::test]
async fn test_no_body_expected_never_reads_body() -> Result<()> {
    let (_, pipeline) = init_pipeline(vec![Reply::with_body(
        StatusCode::OK,
        Some("application/xml"),
        "<Unexpected>payload</Unexpected>",
    )]);

    let out = pipeline.execute(&PutThing::new("blob")).await?;
    assert!(!out.body_seen);
    Ok(())
}

#[tokio::test]
async fn test_body_expected_receives_body() -> Result<()> {
    let (_, pipeline) = init_pipeline(vec![Reply::with_body(
        StatusCode::OK,
        Some("application/json;odata=nometadata"),
        r#"{"value":[]}"#,
    )]);

    let out = pipeline.execute(&GetDoc).await?;
    assert_eq!(out.body, r#"{"value":[]}"#);
    assert_eq!(out.content_type, "application/json;odata=nometadata");
    Ok(())
}

#[tokio::test]
async fn test_content_type_mismatch() {
    let (_, pipeline) = init_pipeline(vec![Reply::with_body(
        StatusCode::OK,
        Some("application/atom+xml"),
        "<feed/>",
    )]);

    let err = pipeline.execute(&GetDoc).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContentTypeMismatch);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (http, pipeline) = init_pipeline(vec![Reply::with_body(
        StatusCode::NOT_FOUND,
        None,
        "BlobNotFound:The specified blob does not exist.",
    )]);

    let err = pipeline.execute(&PutThing::new("missing")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    let detail = err.service_detail().unwrap();
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
    assert_eq!(detail.code, "BlobNotFound");
    assert_eq!(detail.message, "The specified blob does not exist.");
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_server_error_is_retried_with_fresh_request() -> Result<()> {
    let (http, pipeline) = init_pipeline(vec![
        Reply::with_body(StatusCode::SERVICE_UNAVAILABLE, None, "ServerBusy:try later"),
        Reply::Fail(Error::transport("connection reset by peer")),
        Reply::status(StatusCode::CREATED),
    ]);

    pipeline.execute(&PutThing::new("blob")).await?;

    let reqs = http.requests();
    assert_eq!(reqs.len(), 3);
    for req in &reqs {
        assert!(req.headers().contains_key("authorization"));
        assert_eq!(req.body().as_ref(), b"hello world");
    }
    Ok(())
}

#[tokio::test]
async fn test_retries_exhausted_returns_last_error() {
    let (http, pipeline) = init_pipeline(vec![
        Reply::Fail(Error::transport("timeout 1")),
        Reply::Fail(Error::transport("timeout 2")),
        Reply::with_body(StatusCode::INTERNAL_SERVER_ERROR, None, "InternalError:boom"),
    ]);

    let err = pipeline.execute(&PutThing::new("blob")).await.unwrap_err();
    assert_eq!(http.requests().len(), 3);
    assert_eq!(err.service_detail().unwrap().code, "InternalError");
}

#[tokio::test]
async fn test_invalid_uri_fails_before_network() {
    let (http, pipeline) = init_pipeline(vec![]);

    let err = pipeline.execute(&PutThing::new("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_body_parse_failure_is_parse_error() {
    let (_, pipeline) = init_pipeline(vec![Reply::Response(
        http::Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .body(Bytes::from_static(&[0xff, 0xfe]))
            .unwrap(),
    )]);

    let err = pipeline.execute(&GetDoc).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}
