use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use storwire_azure_storage::{
    AcquireLease, Block, DeleteBlob, DeleteSnapshots, LeaseDuration, PutBlob, SigningScheme,
};
use storwire_core::{ErrorKind, Result};

use crate::mock::{header, init_client, respond, respond_with, MockHttpSend};

#[tokio::test]
async fn test_get_block_list() -> Result<()> {
    let http = MockHttpSend::new(|_| {
        Ok(http::Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/xml")
            .header("etag", "\"0x1\"")
            .header("x-ms-blob-content-length", "5")
            .body(Bytes::from_static(
                b"<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList>\
                  <CommittedBlocks><Block><Name>QQ==</Name><Size>5</Size></Block></CommittedBlocks>\
                  </BlockList>",
            ))
            .unwrap())
    });
    let client = init_client(&http);

    let resp = client.get_block_list("container", "blob").await?;
    assert_eq!(
        resp.block_list.committed,
        vec![Block {
            id: "QQ==".to_string(),
            size: 5
        }]
    );
    assert!(resp.block_list.uncommitted.is_empty());
    assert_eq!(resp.blob_content_length, Some(5));

    let reqs = http.requests();
    assert_eq!(reqs[0].method(), Method::GET);
    assert_eq!(
        reqs[0].uri().query(),
        Some("comp=blocklist&blocklisttype=all")
    );
    Ok(())
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let http = MockHttpSend::new(|_| {
        Ok(http::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("content-type", "application/xml")
            .header("x-ms-error-code", "BlobNotFound")
            .body(Bytes::from_static(
                b"<Error><Code>BlobNotFound</Code><Message>The specified blob does not exist.</Message></Error>",
            ))
            .unwrap())
    });
    let client = init_client(&http);

    let err = client.delete_blob("container", "missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert!(!err.is_temporary());
    let detail = err.service_detail().unwrap();
    assert_eq!(detail.code, "BlobNotFound");
    assert_eq!(detail.message, "The specified blob does not exist.");
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_server_busy_is_retried_with_fresh_signature() {
    let http = MockHttpSend::new(|_| {
        respond_with(
            StatusCode::SERVICE_UNAVAILABLE,
            "application/xml",
            "<Error><Code>ServerBusy</Code></Error>",
        )
    });
    let client = init_client(&http);

    let err = client.delete_blob("container", "blob").await.unwrap_err();
    let detail = err.service_detail().unwrap();
    assert_eq!(detail.code, "ServerBusy");
    assert_eq!(detail.message, "NotProvided");

    let reqs = http.requests();
    assert_eq!(reqs.len(), 3);
    for req in &reqs {
        assert!(header(req, "x-ms-date").is_some());
        assert!(header(req, "authorization").is_some());
    }
}

#[tokio::test]
async fn test_optional_headers_only_when_set() -> Result<()> {
    let http = MockHttpSend::new(|_| respond(StatusCode::ACCEPTED));
    let client = init_client(&http);

    client
        .execute(&DeleteBlob::new(client.settings(), "container", "a")?)
        .await?;
    client
        .execute(
            &DeleteBlob::new(client.settings(), "container", "b")?
                .with_delete_snapshots(DeleteSnapshots::Include),
        )
        .await?;

    let reqs = http.requests();
    assert_eq!(header(&reqs[0], "x-ms-delete-snapshots"), None);
    assert_eq!(header(&reqs[0], "x-ms-lease-id"), None);
    assert_eq!(
        header(&reqs[1], "x-ms-delete-snapshots").as_deref(),
        Some("include")
    );
    Ok(())
}

#[tokio::test]
async fn test_acquire_lease() -> Result<()> {
    let http = MockHttpSend::new(|_| {
        Ok(http::Response::builder()
            .status(StatusCode::CREATED)
            .header("x-ms-lease-id", "f81d4fae-7dec-11d0-a765-00a0c91e6bf6")
            .body(Bytes::new())
            .unwrap())
    });
    let client = init_client(&http);

    let op = AcquireLease::new(client.settings(), "container", "blob", LeaseDuration::INFINITE)?;
    let resp = client.execute(&op).await?;
    assert_eq!(
        resp.lease_id.as_deref(),
        Some("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")
    );

    let reqs = http.requests();
    assert_eq!(header(&reqs[0], "x-ms-lease-duration").as_deref(), Some("-1"));
    assert_eq!(header(&reqs[0], "content-length").as_deref(), Some("0"));
    Ok(())
}

#[tokio::test]
async fn test_put_message() -> Result<()> {
    let http = MockHttpSend::new(|_| {
        respond_with(
            StatusCode::CREATED,
            "application/xml",
            "<QueueMessagesList><QueueMessage><MessageId>id-1</MessageId><PopReceipt>receipt</PopReceipt></QueueMessage></QueueMessagesList>",
        )
    });
    let client = init_client(&http);

    let resp = client.put_message("jobs", "hello").await?;
    assert_eq!(resp.message.message_id, "id-1");
    assert_eq!(resp.message.pop_receipt, "receipt");

    let reqs = http.requests();
    let req = &reqs[0];
    assert_eq!(req.method(), Method::POST);
    assert_eq!(
        req.uri().to_string(),
        "http://127.0.0.1:10001/devstoreaccount1/jobs/messages"
    );
    assert_eq!(
        req.body().as_ref(),
        b"<QueueMessage><MessageText>hello</MessageText></QueueMessage>"
    );
    Ok(())
}

#[tokio::test]
async fn test_query_tables_requires_json() {
    let http = MockHttpSend::new(|_| {
        respond_with(StatusCode::OK, "application/atom+xml", "<feed/>")
    });
    let client = init_client(&http);

    let err = client.query_tables().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContentTypeMismatch);
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_query_tables_with_shared_key_lite() -> Result<()> {
    let http = MockHttpSend::new(|_| {
        respond_with(
            StatusCode::OK,
            "application/json;odata=nometadata",
            r#"{"value":[{"TableName":"logs"}]}"#,
        )
    });
    let client = init_client(&http).with_scheme(SigningScheme::SharedKeyLite);

    let resp = client.query_tables().await?;
    assert_eq!(resp.tables, vec!["logs".to_string()]);

    let reqs = http.requests();
    assert!(header(&reqs[0], "authorization")
        .unwrap()
        .starts_with("SharedKeyLite devstoreaccount1:"));
    Ok(())
}

#[tokio::test]
async fn test_validation_fails_before_network() {
    let http = MockHttpSend::new(|_| respond(StatusCode::CREATED));
    let client = init_client(&http);

    assert_eq!(
        client.put_message("", "hello").await.unwrap_err().kind(),
        ErrorKind::RequestInvalid
    );
    // An empty path segment inside the blob name only surfaces when the uri is built.
    let op = PutBlob::new(client.settings(), "container", "a//b", Bytes::new()).unwrap();
    assert_eq!(op.content_md5(), "1B2M2Y8AsgTpgAmY7PhCfg==");
    assert_eq!(
        client.execute(&op).await.unwrap_err().kind(),
        ErrorKind::RequestInvalid
    );
    assert!(LeaseDuration::new(14).is_err());
    assert!(http.requests().is_empty());
}
