use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use storwire_azure_storage::{UploadOptions, UploadStrategy};
use storwire_core::{Error, ErrorKind, Result};

use crate::mock::{header, init_client, query_get, respond, respond_with, MockHttpSend};

fn options(ceiling: usize, block_size: usize) -> UploadOptions {
    UploadOptions {
        single_upload_ceiling: ceiling,
        block_size,
        concurrency: 3,
        content_type: Some("text/plain".to_string()),
        ..Default::default()
    }
}

fn commit_ids(body: &[u8]) -> Vec<String> {
    let body = std::str::from_utf8(body).unwrap();
    body.split("<Latest>")
        .skip(1)
        .map(|part| part.split("</Latest>").next().unwrap().to_string())
        .collect()
}

fn is_stage(req: &http::Request<Bytes>) -> bool {
    query_get(req, "comp").as_deref() == Some("block")
}

fn is_commit(req: &http::Request<Bytes>) -> bool {
    query_get(req, "comp").as_deref() == Some("blocklist")
}

#[tokio::test]
async fn test_small_buffer_uses_single_request() -> Result<()> {
    let http = MockHttpSend::new(|_| {
        Ok(http::Response::builder()
            .status(StatusCode::CREATED)
            .header("etag", "\"0x8DC\"")
            .header("last-modified", "Tue, 02 Jan 2024 03:04:05 GMT")
            .body(Bytes::new())
            .unwrap())
    });
    let client = init_client(&http);

    let data = Bytes::from_static(b"hello world");
    let outcome = client
        .upload("container", "dir/small.txt", data.clone(), options(11, 4))
        .await?;

    assert_eq!(outcome.strategy, UploadStrategy::Single);
    assert_eq!(outcome.block_count, 0);
    assert_eq!(outcome.etag.as_deref(), Some("\"0x8DC\""));
    assert!(outcome.last_modified.is_some());

    let reqs = http.requests();
    assert_eq!(reqs.len(), 1);
    let req = &reqs[0];
    assert_eq!(req.method(), Method::PUT);
    assert_eq!(
        req.uri().to_string(),
        "http://127.0.0.1:10000/devstoreaccount1/container/dir/small.txt"
    );
    assert_eq!(header(req, "x-ms-blob-type").as_deref(), Some("BlockBlob"));
    assert_eq!(header(req, "content-type").as_deref(), Some("text/plain"));
    assert_eq!(header(req, "x-ms-version").as_deref(), Some("2019-12-12"));
    assert!(header(req, "authorization")
        .unwrap()
        .starts_with("SharedKey devstoreaccount1:"));
    assert_eq!(req.body(), &data);
    Ok(())
}

#[tokio::test]
async fn test_large_buffer_stages_blocks_then_commits() -> Result<()> {
    let http = MockHttpSend::new(|req| {
        if is_commit(req) {
            Ok(http::Response::builder()
                .status(StatusCode::CREATED)
                .header("etag", "\"0xCOMMIT\"")
                .body(Bytes::new())
                .unwrap())
        } else {
            respond(StatusCode::CREATED)
        }
    });
    let client = init_client(&http);

    let data = Bytes::from_static(b"abcdefghijklmnopqrstuvwxyz");
    let outcome = client
        .upload("container", "big.bin", data.clone(), options(8, 4))
        .await?;

    assert_eq!(outcome.strategy, UploadStrategy::Blocks);
    assert_eq!(outcome.block_count, 7);
    assert_eq!(outcome.etag.as_deref(), Some("\"0xCOMMIT\""));

    let reqs = http.requests();
    assert_eq!(reqs.len(), 8);

    // The commit is issued last, after the barrier.
    let (commit, stages) = reqs.split_last().unwrap();
    assert!(is_commit(commit));
    assert!(stages.iter().all(is_stage));
    assert_eq!(
        header(commit, "x-ms-blob-content-type").as_deref(),
        Some("text/plain")
    );
    assert_eq!(
        header(commit, "x-ms-blob-content-md5"),
        Some(outcome.content_md5.clone())
    );

    let staged: HashMap<String, Bytes> = stages
        .iter()
        .map(|req| (query_get(req, "blockid").unwrap(), req.body().clone()))
        .collect();
    assert_eq!(staged.len(), 7);

    // Every id appears exactly once, in chunk order.
    let ids = commit_ids(commit.body());
    assert_eq!(ids.len(), 7);
    let mut rebuilt = Vec::new();
    for id in &ids {
        rebuilt.extend_from_slice(&staged[id]);
    }
    assert_eq!(rebuilt, data.to_vec());
    assert_eq!(staged[&ids[6]].as_ref(), b"yz");
    Ok(())
}

#[tokio::test]
async fn test_failed_block_aborts_commit() {
    let http = MockHttpSend::new(|req| {
        if is_stage(req) && req.body().as_ref() == b"efgh" {
            return respond_with(
                StatusCode::FORBIDDEN,
                "application/xml",
                "<Error><Code>AuthorizationFailure</Code><Message>denied</Message></Error>",
            );
        }
        respond(StatusCode::CREATED)
    });
    let client = init_client(&http);

    let err = client
        .upload(
            "container",
            "big.bin",
            Bytes::from_static(b"abcdefghijklmnop"),
            options(8, 4),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    let detail = err.service_detail().unwrap();
    assert_eq!(detail.status, StatusCode::FORBIDDEN);
    assert_eq!(detail.code, "AuthorizationFailure");
    assert_eq!(detail.message, "denied");

    let reqs = http.requests();
    // All four blocks were attempted once, nothing was committed.
    assert_eq!(reqs.iter().filter(|r| is_stage(r)).count(), 4);
    assert!(!reqs.iter().any(is_commit));
}

#[tokio::test]
async fn test_first_failing_block_in_order_is_reported() {
    let http = MockHttpSend::new(|req| {
        if !is_stage(req) {
            return respond(StatusCode::CREATED);
        }
        match req.body().as_ref() {
            b"ijkl" => respond_with(
                StatusCode::BAD_REQUEST,
                "application/xml",
                "<Error><Code>InvalidBlockId</Code></Error>",
            ),
            b"mnop" => respond_with(
                StatusCode::BAD_REQUEST,
                "application/xml",
                "<Error><Code>InvalidMd5</Code></Error>",
            ),
            _ => respond(StatusCode::CREATED),
        }
    });
    let client = init_client(&http);

    let err = client
        .upload(
            "container",
            "big.bin",
            Bytes::from_static(b"abcdefghijklmnop"),
            options(8, 4),
        )
        .await
        .unwrap_err();

    assert_eq!(err.service_detail().unwrap().code, "InvalidBlockId");
}

#[tokio::test]
async fn test_transient_block_failure_is_retried() -> Result<()> {
    let failed_once = Arc::new(AtomicBool::new(false));
    let flag = failed_once.clone();
    let http = MockHttpSend::new(move |req| {
        if is_stage(req) && req.body().as_ref() == b"ijkl" && !flag.swap(true, Ordering::SeqCst) {
            return Err(Error::transport("connection reset by peer"));
        }
        respond(StatusCode::CREATED)
    });
    let client = init_client(&http);

    let outcome = client
        .upload(
            "container",
            "big.bin",
            Bytes::from_static(b"abcdefghijkl"),
            options(8, 4),
        )
        .await?;

    assert_eq!(outcome.block_count, 3);
    assert!(failed_once.load(Ordering::SeqCst));
    let reqs = http.requests();
    assert_eq!(reqs.iter().filter(|r| is_stage(r)).count(), 4);
    assert_eq!(reqs.iter().filter(|r| is_commit(r)).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_options_fail_before_network() {
    let http = MockHttpSend::new(|_| respond(StatusCode::CREATED));
    let client = init_client(&http);

    let err = client
        .upload(
            "container",
            "big.bin",
            Bytes::from_static(b"abcdefghijkl"),
            options(8, 0),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(http.requests().is_empty());
}
