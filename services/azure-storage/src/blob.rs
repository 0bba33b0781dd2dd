//! Blob service operations.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::{Extensions, HeaderMap, HeaderValue, Method};
use storwire_core::hash::{base64_decode, base64_md5};
use storwire_core::operation::header_str;
use storwire_core::time::{parse_http_date, DateTime};
use storwire_core::{EmptyResponse, Error, Operation, ReceiveResponse, Result, UriBuilder};

use crate::block_list::{put_block_list_body, BlockList};
use crate::constants::*;
use crate::{AccountSettings, LeaseDuration, Service};

pub(crate) fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::request_invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Metadata names become part of a header name, so they must be identifiers.
pub(crate) fn validate_metadata(metadata: &[(String, String)]) -> Result<()> {
    for (name, _) in metadata {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(Error::request_invalid(format!(
                "metadata name {name:?} is not a valid identifier"
            )));
        }
    }
    Ok(())
}

fn insert_metadata(headers: &mut HeaderMap, metadata: &[(String, String)]) -> Result<()> {
    for (name, value) in metadata {
        let name: HeaderName = format!("{X_MS_META_PREFIX}{}", name.to_lowercase()).parse()?;
        headers.insert(name, value.parse::<HeaderValue>()?);
    }
    Ok(())
}

/// Location of one blob: container plus a name that may contain `/`.
#[derive(Debug, Clone)]
struct BlobPath {
    settings: Arc<AccountSettings>,
    container: String,
    blob: String,
}

impl BlobPath {
    fn new(settings: Arc<AccountSettings>, container: &str, blob: &str) -> Result<Self> {
        require("container name", container)?;
        require("blob name", blob)?;
        Ok(Self {
            settings,
            container: container.to_string(),
            blob: blob.to_string(),
        })
    }

    fn uri(&self) -> UriBuilder {
        self.blob
            .split('/')
            .fold(
                self.settings.uri(Service::Blob).push_segment(&self.container),
                |uri, segment| uri.push_segment(segment),
            )
    }
}

fn blob_extensions(extensions: &mut Extensions) {
    extensions.insert(Service::Blob);
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, name).map(str::to_string)
}

fn header_date(headers: &HeaderMap) -> Result<Option<DateTime>> {
    header_str(headers, LAST_MODIFIED.as_str())
        .map(parse_http_date)
        .transpose()
}

/// Response of operations that write blob content.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlobWriteResponse {
    /// ETag of the blob after the write.
    pub etag: Option<String>,
    /// Last modified time of the blob after the write.
    pub last_modified: Option<DateTime>,
    /// MD5 the service computed for the received content.
    pub content_md5: Option<String>,
    /// Request id assigned by the service.
    pub request_id: Option<String>,
    /// Whether the content is stored encrypted.
    pub server_encrypted: bool,
}

impl ReceiveResponse for BlobWriteResponse {
    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.etag = header_string(headers, ETAG.as_str());
        self.last_modified = header_date(headers)?;
        self.content_md5 = header_string(headers, CONTENT_MD5);
        self.request_id = header_string(headers, X_MS_REQUEST_ID);
        self.server_encrypted = header_str(headers, X_MS_REQUEST_SERVER_ENCRYPTED) == Some("true");
        Ok(())
    }
}

/// Upload a whole block blob in one request.
///
/// - [Put Blob](https://learn.microsoft.com/en-us/rest/api/storageservices/put-blob)
#[derive(Debug, Clone)]
pub struct PutBlob {
    path: BlobPath,
    body: Bytes,
    content_md5: String,
    content_type: Option<String>,
    cache_control: Option<String>,
    metadata: Vec<(String, String)>,
}

impl PutBlob {
    /// Create a put blob operation, computing the MD5 of `body`.
    pub fn new(
        settings: Arc<AccountSettings>,
        container: &str,
        blob: &str,
        body: Bytes,
    ) -> Result<Self> {
        Ok(Self {
            path: BlobPath::new(settings, container, blob)?,
            content_md5: base64_md5(&body),
            body,
            content_type: None,
            cache_control: None,
            metadata: Vec::new(),
        })
    }

    /// Set the content type stored with the blob.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the cache control stored with the blob.
    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    /// Set user metadata.
    pub fn with_metadata(mut self, metadata: Vec<(String, String)>) -> Result<Self> {
        validate_metadata(&metadata)?;
        self.metadata = metadata;
        Ok(self)
    }

    /// Base64 MD5 of the body.
    pub fn content_md5(&self) -> &str {
        &self.content_md5
    }
}

impl Operation for PutBlob {
    type Output = BlobWriteResponse;

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> UriBuilder {
        self.path.uri()
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(X_MS_BLOB_TYPE, HeaderValue::from_static("BlockBlob"));
        headers.insert(CONTENT_MD5, self.content_md5.parse()?);
        insert_metadata(headers, &self.metadata)
    }

    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        vec![
            (CONTENT_TYPE, self.content_type.clone()),
            (
                HeaderName::from_static(X_MS_BLOB_CACHE_CONTROL),
                self.cache_control.clone(),
            ),
        ]
    }

    fn body(&self) -> Option<Bytes> {
        Some(self.body.clone())
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}

/// Response of [`PutBlock`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PutBlockResponse {
    /// MD5 the service computed for the block.
    pub content_md5: Option<String>,
    /// Request id assigned by the service.
    pub request_id: Option<String>,
    /// Whether the block is stored encrypted.
    pub server_encrypted: bool,
}

impl ReceiveResponse for PutBlockResponse {
    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.content_md5 = header_string(headers, CONTENT_MD5);
        self.request_id = header_string(headers, X_MS_REQUEST_ID);
        self.server_encrypted = header_str(headers, X_MS_REQUEST_SERVER_ENCRYPTED) == Some("true");
        Ok(())
    }
}

/// Stage one uncommitted block.
///
/// - [Put Block](https://learn.microsoft.com/en-us/rest/api/storageservices/put-block)
#[derive(Debug, Clone)]
pub struct PutBlock {
    path: BlobPath,
    block_id: String,
    body: Bytes,
    content_md5: String,
}

impl PutBlock {
    /// Create a put block operation, computing the MD5 of `body`.
    ///
    /// `block_id` is the base64 encoded id as sent on the wire.
    pub fn new(
        settings: Arc<AccountSettings>,
        container: &str,
        blob: &str,
        block_id: &str,
        body: Bytes,
    ) -> Result<Self> {
        let path = BlobPath::new(settings, container, blob)?;
        require("block id", block_id)?;
        base64_decode(block_id)
            .map_err(|e| Error::request_invalid("block id must be base64 encoded").with_source(e))?;

        Ok(Self {
            path,
            block_id: block_id.to_string(),
            content_md5: base64_md5(&body),
            body,
        })
    }

    /// Base64 encoded block id.
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    /// Base64 MD5 of the block.
    pub fn content_md5(&self) -> &str {
        &self.content_md5
    }
}

impl Operation for PutBlock {
    type Output = PutBlockResponse;

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> UriBuilder {
        self.path
            .uri()
            .push_query("comp", "block")
            .push_query("blockid", &self.block_id)
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(CONTENT_MD5, self.content_md5.parse()?);
        Ok(())
    }

    fn body(&self) -> Option<Bytes> {
        Some(self.body.clone())
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}

/// Commit staged blocks, in the given order, into the blob.
///
/// - [Put Block List](https://learn.microsoft.com/en-us/rest/api/storageservices/put-block-list)
#[derive(Debug, Clone)]
pub struct PutBlockList {
    path: BlobPath,
    block_ids: Vec<String>,
    body: Bytes,
    content_type: Option<String>,
    cache_control: Option<String>,
    blob_content_md5: Option<String>,
    metadata: Vec<(String, String)>,
}

impl PutBlockList {
    /// Create a put block list operation committing `block_ids` as `Latest`.
    pub fn new(
        settings: Arc<AccountSettings>,
        container: &str,
        blob: &str,
        block_ids: Vec<String>,
    ) -> Result<Self> {
        let path = BlobPath::new(settings, container, blob)?;
        if let Some(id) = block_ids.iter().find(|id| id.is_empty()) {
            return Err(Error::request_invalid(format!("block id {id:?} must not be empty")));
        }
        let body = Bytes::from(put_block_list_body(&block_ids)?);

        Ok(Self {
            path,
            block_ids,
            body,
            content_type: None,
            cache_control: None,
            blob_content_md5: None,
            metadata: Vec::new(),
        })
    }

    /// Set the content type stored with the blob.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the cache control stored with the blob.
    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    /// Set the MD5 stored as the content MD5 of the whole blob.
    pub fn with_blob_content_md5(mut self, md5: impl Into<String>) -> Self {
        self.blob_content_md5 = Some(md5.into());
        self
    }

    /// Set user metadata.
    pub fn with_metadata(mut self, metadata: Vec<(String, String)>) -> Result<Self> {
        validate_metadata(&metadata)?;
        self.metadata = metadata;
        Ok(self)
    }

    /// Block ids in commit order.
    pub fn block_ids(&self) -> &[String] {
        &self.block_ids
    }
}

impl Operation for PutBlockList {
    type Output = BlobWriteResponse;

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> UriBuilder {
        self.path.uri().push_query("comp", "blocklist")
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        insert_metadata(headers, &self.metadata)
    }

    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        vec![
            (
                HeaderName::from_static(X_MS_BLOB_CONTENT_TYPE),
                self.content_type.clone(),
            ),
            (
                HeaderName::from_static(X_MS_BLOB_CACHE_CONTROL),
                self.cache_control.clone(),
            ),
            (
                HeaderName::from_static(X_MS_BLOB_CONTENT_MD5),
                self.blob_content_md5.clone(),
            ),
        ]
    }

    fn body(&self) -> Option<Bytes> {
        Some(self.body.clone())
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}

/// Response of [`GetBlockList`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GetBlockListResponse {
    /// Blocks of the blob.
    pub block_list: BlockList,
    /// ETag of the blob, absent when it has no committed blocks.
    pub etag: Option<String>,
    /// Size of the committed blob.
    pub blob_content_length: Option<u64>,
}

impl ReceiveResponse for GetBlockListResponse {
    const EXPECTS_BODY: bool = true;

    fn expected_content_type() -> Option<&'static str> {
        Some("application/xml")
    }

    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.etag = header_string(headers, ETAG.as_str());
        self.blob_content_length = header_str(headers, X_MS_BLOB_CONTENT_LENGTH)
            .map(|v| {
                v.parse::<u64>().map_err(|e| {
                    Error::parse(format!("invalid {X_MS_BLOB_CONTENT_LENGTH}: {v}")).with_source(e)
                })
            })
            .transpose()?;
        Ok(())
    }

    fn receive_body(&mut self, body: Bytes, _: Option<&str>) -> Result<()> {
        self.block_list = BlockList::from_xml(&body)?;
        Ok(())
    }
}

/// List committed and uncommitted blocks of a blob.
///
/// - [Get Block List](https://learn.microsoft.com/en-us/rest/api/storageservices/get-block-list)
#[derive(Debug, Clone)]
pub struct GetBlockList {
    path: BlobPath,
}

impl GetBlockList {
    /// Create a get block list operation listing all blocks.
    pub fn new(settings: Arc<AccountSettings>, container: &str, blob: &str) -> Result<Self> {
        Ok(Self {
            path: BlobPath::new(settings, container, blob)?,
        })
    }
}

impl Operation for GetBlockList {
    type Output = GetBlockListResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self) -> UriBuilder {
        self.path
            .uri()
            .push_query("comp", "blocklist")
            .push_query("blocklisttype", "all")
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}

/// Response of [`AcquireLease`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LeaseResponse {
    /// Id of the acquired lease.
    pub lease_id: Option<String>,
    /// ETag of the blob.
    pub etag: Option<String>,
    /// Last modified time of the blob.
    pub last_modified: Option<DateTime>,
}

impl ReceiveResponse for LeaseResponse {
    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.lease_id = header_string(headers, X_MS_LEASE_ID);
        self.etag = header_string(headers, ETAG.as_str());
        self.last_modified = header_date(headers)?;
        Ok(())
    }
}

/// Acquire a write lease on a blob.
///
/// - [Lease Blob](https://learn.microsoft.com/en-us/rest/api/storageservices/lease-blob)
#[derive(Debug, Clone)]
pub struct AcquireLease {
    path: BlobPath,
    duration: LeaseDuration,
    proposed_lease_id: Option<String>,
}

impl AcquireLease {
    /// Create an acquire lease operation.
    pub fn new(
        settings: Arc<AccountSettings>,
        container: &str,
        blob: &str,
        duration: LeaseDuration,
    ) -> Result<Self> {
        Ok(Self {
            path: BlobPath::new(settings, container, blob)?,
            duration,
            proposed_lease_id: None,
        })
    }

    /// Propose the lease id; it must be a GUID.
    pub fn with_proposed_lease_id(mut self, lease_id: &str) -> Result<Self> {
        uuid::Uuid::parse_str(lease_id).map_err(|e| {
            Error::request_invalid(format!("proposed lease id {lease_id:?} is not a GUID"))
                .with_source(e)
        })?;
        self.proposed_lease_id = Some(lease_id.to_string());
        Ok(self)
    }
}

impl Operation for AcquireLease {
    type Output = LeaseResponse;

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self) -> UriBuilder {
        self.path.uri().push_query("comp", "lease")
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(X_MS_LEASE_ACTION, HeaderValue::from_static("acquire"));
        headers.insert(X_MS_LEASE_DURATION, HeaderValue::from(self.duration.seconds()));
        Ok(())
    }

    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        vec![(
            HeaderName::from_static(X_MS_PROPOSED_LEASE_ID),
            self.proposed_lease_id.clone(),
        )]
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}

/// How snapshots are handled when deleting a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSnapshots {
    /// Delete the blob and all of its snapshots.
    Include,
    /// Delete only the snapshots.
    Only,
}

impl DeleteSnapshots {
    fn as_str(&self) -> &'static str {
        match self {
            DeleteSnapshots::Include => "include",
            DeleteSnapshots::Only => "only",
        }
    }
}

/// Delete a blob.
///
/// - [Delete Blob](https://learn.microsoft.com/en-us/rest/api/storageservices/delete-blob)
#[derive(Debug, Clone)]
pub struct DeleteBlob {
    path: BlobPath,
    lease_id: Option<String>,
    delete_snapshots: Option<DeleteSnapshots>,
}

impl DeleteBlob {
    /// Create a delete blob operation.
    pub fn new(settings: Arc<AccountSettings>, container: &str, blob: &str) -> Result<Self> {
        Ok(Self {
            path: BlobPath::new(settings, container, blob)?,
            lease_id: None,
            delete_snapshots: None,
        })
    }

    /// Delete a leased blob.
    pub fn with_lease_id(mut self, lease_id: &str) -> Result<Self> {
        require("lease id", lease_id)?;
        self.lease_id = Some(lease_id.to_string());
        Ok(self)
    }

    /// Decide what happens to snapshots of the blob.
    pub fn with_delete_snapshots(mut self, delete_snapshots: DeleteSnapshots) -> Self {
        self.delete_snapshots = Some(delete_snapshots);
        self
    }
}

impl Operation for DeleteBlob {
    type Output = EmptyResponse;

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self) -> UriBuilder {
        self.path.uri()
    }

    fn optional_headers(&self) -> Vec<(HeaderName, Option<String>)> {
        vec![
            (HeaderName::from_static(X_MS_LEASE_ID), self.lease_id.clone()),
            (
                HeaderName::from_static(X_MS_DELETE_SNAPSHOTS),
                self.delete_snapshots.map(|v| v.as_str().to_string()),
            ),
        ]
    }

    fn extensions(&self, extensions: &mut Extensions) {
        blob_extensions(extensions)
    }
}
