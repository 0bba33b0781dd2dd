//! Block list documents.
//!
//! - [Get Block List](https://learn.microsoft.com/en-us/rest/api/storageservices/get-block-list)
//! - [Put Block List](https://learn.microsoft.com/en-us/rest/api/storageservices/put-block-list)

use serde::{Deserialize, Serialize};
use storwire_core::{Error, Result};

/// One block of a blob: its id as sent on the wire and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    /// Base64 encoded block id.
    #[serde(rename = "Name")]
    pub id: String,
    /// Size of the block in bytes.
    pub size: u64,
}

/// Blocks of a blob, split by commit state, each in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    /// Blocks that are part of the blob.
    pub committed: Vec<Block>,
    /// Blocks staged but not yet committed.
    pub uncommitted: Vec<Block>,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct BlockListDocument {
    committed_blocks: BlockGroup,
    uncommitted_blocks: BlockGroup,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct BlockGroup {
    #[serde(rename = "Block")]
    blocks: Vec<Block>,
}

impl BlockList {
    /// Parse a `Get Block List` response body.
    ///
    /// A missing group yields an empty list for that group.
    pub fn from_xml(bs: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bs)
            .map_err(|e| Error::parse("block list is not valid utf-8").with_source(e))?;
        let doc: BlockListDocument = quick_xml::de::from_str(text.trim_start_matches('\u{feff}'))
            .map_err(|e| Error::parse("failed to parse block list").with_source(e))?;

        Ok(Self {
            committed: doc.committed_blocks.blocks,
            uncommitted: doc.uncommitted_blocks.blocks,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "BlockList", rename_all = "PascalCase")]
struct PutBlockListDocument<'a> {
    latest: &'a [String],
}

/// Build the `Put Block List` body committing given ids in order.
///
/// Every id is listed as `Latest` so the most recently staged version wins.
pub fn put_block_list_body(ids: &[String]) -> Result<String> {
    quick_xml::se::to_string(&PutBlockListDocument { latest: ids })
        .map_err(|e| Error::unexpected("failed to serialize block list").with_source(e))
}
