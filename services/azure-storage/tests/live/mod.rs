use std::env;

use bytes::Bytes;
use log::{debug, warn};
use pretty_assertions::assert_eq;
use storwire_azure_storage::{Client, UploadOptions, UploadStrategy};
use storwire_core::{Context, ErrorKind, OsEnv, Result};
use storwire_http_send_reqwest::ReqwestHttpSend;

fn init_client() -> Option<(Client, String)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("STORWIRE_AZURE_STORAGE_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let ctx = Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let client = Client::from_env(ctx).expect("account settings must be provided by env");
    let container = env::var("STORWIRE_AZURE_STORAGE_CONTAINER")
        .expect("env STORWIRE_AZURE_STORAGE_CONTAINER must set");

    Some((client, container))
}

fn blob_name(prefix: &str) -> String {
    format!("storwire-test/{prefix}-{}", uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_live_single_upload() -> Result<()> {
    let Some((client, container)) = init_client() else {
        warn!("STORWIRE_AZURE_STORAGE_TEST is not set, skipped");
        return Ok(());
    };

    let blob = blob_name("single");
    let outcome = client
        .upload(
            &container,
            &blob,
            Bytes::from_static(b"hello, storwire"),
            UploadOptions::default(),
        )
        .await?;
    debug!("single upload outcome: {outcome:?}");
    assert_eq!(outcome.strategy, UploadStrategy::Single);
    assert!(outcome.etag.is_some());

    client.delete_blob(&container, &blob).await?;
    Ok(())
}

#[tokio::test]
async fn test_live_block_upload() -> Result<()> {
    let Some((client, container)) = init_client() else {
        warn!("STORWIRE_AZURE_STORAGE_TEST is not set, skipped");
        return Ok(());
    };

    let blob = blob_name("blocks");
    let data: Vec<u8> = (0..(3 << 20) + 17).map(|i| (i % 251) as u8).collect();
    let options = UploadOptions {
        single_upload_ceiling: 1 << 20,
        block_size: 1 << 20,
        concurrency: 2,
        ..Default::default()
    };

    let outcome = client
        .upload(&container, &blob, Bytes::from(data.clone()), options)
        .await?;
    debug!("block upload outcome: {outcome:?}");
    assert_eq!(outcome.strategy, UploadStrategy::Blocks);
    assert_eq!(outcome.block_count, 4);

    let list = client.get_block_list(&container, &blob).await?;
    assert_eq!(list.block_list.committed.len(), 4);
    assert!(list.block_list.uncommitted.is_empty());
    assert_eq!(list.blob_content_length, Some(data.len() as u64));

    client.delete_blob(&container, &blob).await?;
    Ok(())
}

#[tokio::test]
async fn test_live_delete_missing_blob() -> Result<()> {
    let Some((client, container)) = init_client() else {
        warn!("STORWIRE_AZURE_STORAGE_TEST is not set, skipped");
        return Ok(());
    };

    let err = client
        .delete_blob(&container, &blob_name("missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.service_detail().unwrap().code, "BlobNotFound");
    Ok(())
}
