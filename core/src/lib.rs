//! Core components for signed and retried storage requests.
//!
//! This crate provides the service-agnostic pieces of the storwire ecosystem.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//! - **Signing**: [`ProvideCredential`] loads credentials, [`SignRequest`] signs requests and
//!   [`Signer`] caches the credential between the two
//! - **Operations**: [`Operation`] and [`ReceiveResponse`] are the capability traits that
//!   request and response shapes implement
//! - **Pipeline**: [`Pipeline`] turns an operation into a signed, retried HTTP exchange
//!   and a typed outcome
//!
//! ## Example
//!
//! ```no_run
//! use storwire_core::{Context, EmptyResponse, Operation, UriBuilder};
//! use http::Method;
//!
//! // Describe an operation: only the capabilities it needs are overridden.
//! struct DeleteBlob {
//!     endpoint: String,
//!     container: String,
//!     blob: String,
//! }
//!
//! impl Operation for DeleteBlob {
//!     type Output = EmptyResponse;
//!
//!     fn method(&self) -> Method {
//!         Method::DELETE
//!     }
//!
//!     fn uri(&self) -> UriBuilder {
//!         UriBuilder::new(&self.endpoint)
//!             .push_segment(&self.container)
//!             .push_segment(&self.blob)
//!     }
//! }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
mod http;
pub use http::HttpSend;
mod env;
pub use env::Env;
pub use env::OsEnv;
pub use env::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result, ServiceErrorDetail};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod request;
pub use request::SigningRequest;
mod signer;
pub use signer::Signer;

mod uri;
pub use uri::{UriBuilder, URI_ENCODE_SET};
mod retry;
pub use retry::{Backoff, DefaultRetryClassifier, RetryClassifier, RetryPolicy};
pub mod operation;
pub use operation::{EmptyResponse, Operation, ReceiveResponse};
mod pipeline;
pub use pipeline::{Pipeline, ServiceProtocol};
