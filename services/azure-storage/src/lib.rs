//! Azure Storage wire protocol for storwire.
//!
//! This crate provides:
//! - Shared Key and Shared Key Lite signing for the blob, queue and table services
//! - the service protocol: `x-ms-date`, `x-ms-version` and error documents
//! - blob, queue and table operations that plug into [`storwire_core::Pipeline`]
//! - chunked block uploads through [`BlockUploadCoordinator`]
//!
//! # Example
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use storwire_azure_storage::{Client, UploadOptions};
//! use storwire_core::{Context, OsEnv};
//! use storwire_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> storwire_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     // Reads STORWIRE_AZURE_ACCOUNT_NAME, STORWIRE_AZURE_ACCOUNT_KEY and friends.
//!     let client = Client::from_env(ctx)?;
//!
//!     let outcome = client
//!         .upload("photos", "2024/cat.jpg", Bytes::from(vec![0; 64 << 20]), UploadOptions::default())
//!         .await?;
//!     println!("uploaded {} blocks, etag {:?}", outcome.block_count, outcome.etag);
//!
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod account;
pub use account::{AccountSettings, Service};

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::{RequestSigner, SigningScheme};

mod error;
pub use error::parse_error_response;

mod protocol;
pub use protocol::AzureProtocol;

mod lease;
pub use lease::LeaseDuration;

pub mod block_list;
pub use block_list::{Block, BlockList};

pub mod blob;
pub use blob::{
    AcquireLease, BlobWriteResponse, DeleteBlob, DeleteSnapshots, GetBlockList,
    GetBlockListResponse, LeaseResponse, PutBlob, PutBlock, PutBlockList, PutBlockResponse,
};

pub mod queue;
pub use queue::{EnqueuedMessage, PutMessage, PutMessageResponse};

pub mod table;
pub use table::{QueryTables, QueryTablesResponse};

pub mod upload;
pub use upload::{BlockUploadCoordinator, UploadOptions, UploadOutcome, UploadStrategy};

mod client;
pub use client::Client;
