use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use storwire_azure_storage::{AccountSettings, Client, Service};
use storwire_core::{Backoff, Context, HttpSend, Result, RetryPolicy};

pub const ACCOUNT: &str = "devstoreaccount1";
pub const KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

type Handler = dyn Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>> + Send + Sync;

/// MockHttpSend answers every request with a handler and records what it saw.
#[derive(Clone)]
pub struct MockHttpSend {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl std::fmt::Debug for MockHttpSend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpSend").finish_non_exhaustive()
    }
}

impl MockHttpSend {
    pub fn new(
        handler: impl Fn(&http::Request<Bytes>) -> Result<http::Response<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
        }
    }

    /// Take all requests recorded so far.
    pub fn requests(&self) -> Vec<http::Request<Bytes>> {
        self.requests.lock().unwrap().drain(..).collect()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let resp = (self.handler)(&req);
        self.requests.lock().unwrap().push(req);
        resp
    }
}

pub fn respond(status: StatusCode) -> Result<http::Response<Bytes>> {
    Ok(http::Response::builder()
        .status(status)
        .body(Bytes::new())
        .unwrap())
}

pub fn respond_with(
    status: StatusCode,
    content_type: &str,
    body: &str,
) -> Result<http::Response<Bytes>> {
    Ok(http::Response::builder()
        .status(status)
        .header("content-type", content_type)
        .body(Bytes::from(body.to_string()))
        .unwrap())
}

/// Client against emulator style endpoints that retries without delay.
pub fn init_client(http: &MockHttpSend) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    let settings = AccountSettings::new(ACCOUNT, KEY)
        .unwrap()
        .with_endpoint(Service::Blob, "http://127.0.0.1:10000/devstoreaccount1")
        .with_endpoint(Service::Queue, "http://127.0.0.1:10001/devstoreaccount1")
        .with_endpoint(Service::Table, "http://127.0.0.1:10002/devstoreaccount1");
    let ctx = Context::new().with_http_send(http.clone());

    Client::new(ctx, settings)
        .with_retry(RetryPolicy::new(3).with_backoff(Backoff::Fixed(Duration::ZERO)))
}

pub fn query_get(req: &http::Request<Bytes>, key: &str) -> Option<String> {
    req.uri().query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| {
            percent_encoding::percent_decode_str(v)
                .decode_utf8_lossy()
                .to_string()
        })
    })
}

pub fn header(req: &http::Request<Bytes>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
