//! Chunked block upload.
//!
//! Small buffers go up with a single `Put Blob`. Larger ones are split into
//! blocks that are staged concurrently and committed with one `Put Block List`
//! once every block has been staged.

use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use futures::{stream, StreamExt};
use log::{debug, warn};
use storwire_core::hash::{base64_encode, base64_md5};
use storwire_core::time::DateTime;
use storwire_core::{Error, Pipeline, Result};
use uuid::Uuid;

use crate::blob::{validate_metadata, PutBlob, PutBlock, PutBlockList};
use crate::{AccountSettings, Credential};

/// Largest block accepted by the service.
pub const MAX_BLOCK_SIZE: usize = 4000 * 1024 * 1024;
/// Most blocks a blob may consist of.
pub const MAX_BLOCK_COUNT: usize = 50_000;

/// Options of a [`BlockUploadCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Buffers up to this many bytes are uploaded with one request.
    pub single_upload_ceiling: usize,
    /// Size of every block but the last.
    pub block_size: usize,
    /// Maximum number of blocks staged at the same time.
    pub concurrency: usize,
    /// Content type stored with the blob.
    pub content_type: Option<String>,
    /// User metadata stored with the blob.
    pub metadata: Vec<(String, String)>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            single_upload_ceiling: 32 * 1024 * 1024,
            block_size: 4 * 1024 * 1024,
            concurrency: 8,
            content_type: None,
            metadata: Vec::new(),
        }
    }
}

impl UploadOptions {
    fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::request_invalid(format!(
                "block size must be between 1 and {MAX_BLOCK_SIZE} bytes, got {}",
                self.block_size
            )));
        }
        if self.concurrency == 0 {
            return Err(Error::request_invalid("upload concurrency must be positive"));
        }
        validate_metadata(&self.metadata)
    }
}

/// Which requests an upload used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// One `Put Blob`.
    Single,
    /// Staged blocks and one `Put Block List`.
    Blocks,
}

/// Result of an upload, whichever strategy was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Strategy used for the upload.
    pub strategy: UploadStrategy,
    /// ETag of the blob.
    pub etag: Option<String>,
    /// Last modified time of the blob.
    pub last_modified: Option<DateTime>,
    /// Base64 MD5 of the whole content.
    pub content_md5: String,
    /// Number of staged blocks, zero for a single request.
    pub block_count: usize,
}

/// One chunk of the source buffer and the id it is staged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    /// Base64 encoded block id.
    pub id: String,
    /// Byte range of the chunk in the source buffer.
    pub range: Range<usize>,
}

/// Split `len` bytes into `ceil(len / block_size)` consecutive ranges.
///
/// Every range but the last is exactly `block_size` long; the last one takes
/// the remainder, or a full block when `len` is a multiple of `block_size`.
pub fn partition(len: usize, block_size: usize) -> Result<Vec<Range<usize>>> {
    if block_size == 0 {
        return Err(Error::request_invalid("block size must be positive"));
    }

    let count = len.div_ceil(block_size);
    Ok((0..count)
        .map(|i| {
            let start = i * block_size;
            start..(start + block_size).min(len)
        })
        .collect())
}

/// Assign a fresh block id to every chunk of a `len` bytes buffer.
pub fn plan_blocks(len: usize, block_size: usize) -> Result<Vec<BlockPlan>> {
    let ranges = partition(len, block_size)?;
    if ranges.len() > MAX_BLOCK_COUNT {
        return Err(Error::request_invalid(format!(
            "upload of {len} bytes needs {} blocks of {block_size} bytes, at most {MAX_BLOCK_COUNT} allowed",
            ranges.len()
        )));
    }

    // Every id encodes 16 bytes, so all ids of a blob share the same length.
    Ok(ranges
        .into_iter()
        .map(|range| BlockPlan {
            id: base64_encode(Uuid::new_v4().as_bytes()),
            range,
        })
        .collect())
}

/// BlockUploadCoordinator uploads a buffer as one blob, staging blocks when the
/// buffer is larger than the single upload ceiling.
#[derive(Debug, Clone)]
pub struct BlockUploadCoordinator {
    pipeline: Pipeline<Credential>,
    settings: Arc<AccountSettings>,
    options: UploadOptions,
}

impl BlockUploadCoordinator {
    /// Create a coordinator, rejecting invalid options.
    pub fn new(
        pipeline: Pipeline<Credential>,
        settings: Arc<AccountSettings>,
        options: UploadOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            pipeline,
            settings,
            options,
        })
    }

    /// Get the options of this coordinator.
    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Upload `data` into `container/blob`.
    ///
    /// If any block fails to stage, nothing is committed and the failure of the
    /// first failing block in buffer order is returned. Blocks that did get
    /// staged stay uncommitted and are collected by the service.
    pub async fn upload(&self, container: &str, blob: &str, data: Bytes) -> Result<UploadOutcome> {
        let content_md5 = base64_md5(&data);

        if data.len() <= self.options.single_upload_ceiling {
            debug!(
                "uploading {container}/{blob} with a single request of {} bytes",
                data.len()
            );
            let mut op = PutBlob::new(self.settings.clone(), container, blob, data)?
                .with_metadata(self.options.metadata.clone())?;
            if let Some(content_type) = &self.options.content_type {
                op = op.with_content_type(content_type);
            }

            let resp = self.pipeline.execute(&op).await?;
            return Ok(UploadOutcome {
                strategy: UploadStrategy::Single,
                etag: resp.etag,
                last_modified: resp.last_modified,
                content_md5,
                block_count: 0,
            });
        }

        let plans = plan_blocks(data.len(), self.options.block_size)?;
        // Build every request first so that a bad argument fails before any traffic.
        let stages = plans
            .iter()
            .map(|plan| {
                PutBlock::new(
                    self.settings.clone(),
                    container,
                    blob,
                    &plan.id,
                    data.slice(plan.range.clone()),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let mut commit = PutBlockList::new(
            self.settings.clone(),
            container,
            blob,
            plans.iter().map(|plan| plan.id.clone()).collect(),
        )?
        .with_blob_content_md5(&content_md5)
        .with_metadata(self.options.metadata.clone())?;
        if let Some(content_type) = &self.options.content_type {
            commit = commit.with_content_type(content_type);
        }

        debug!(
            "uploading {container}/{blob} as {} blocks of {} bytes, {} at a time",
            stages.len(),
            self.options.block_size,
            self.options.concurrency
        );
        let results: Vec<_> = stream::iter(stages.iter().map(|op| self.pipeline.execute(op)))
            .buffered(self.options.concurrency)
            .collect()
            .await;

        // Every stage has completed here; commit only when all of them succeeded.
        for (idx, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                warn!("staging block {idx} of {container}/{blob} failed, upload abandoned: {err}");
                return Err(err);
            }
        }

        let resp = self.pipeline.execute(&commit).await?;
        Ok(UploadOutcome {
            strategy: UploadStrategy::Blocks,
            etag: resp.etag,
            last_modified: resp.last_modified,
            content_md5,
            block_count: plans.len(),
        })
    }
}
