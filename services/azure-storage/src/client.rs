use std::sync::Arc;

use bytes::Bytes;
use storwire_core::{Context, Operation, Pipeline, Result, RetryPolicy, Signer};

use crate::blob::{DeleteBlob, GetBlockList, GetBlockListResponse};
use crate::queue::{PutMessage, PutMessageResponse};
use crate::table::{QueryTables, QueryTablesResponse};
use crate::upload::{BlockUploadCoordinator, UploadOptions, UploadOutcome};
use crate::{
    AccountSettings, AzureProtocol, Config, Credential, RequestSigner, SigningScheme,
    StaticCredentialProvider,
};

/// Client executes operations against one storage account.
///
/// Cheap to clone; clones share the account settings and the cached credential.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    settings: Arc<AccountSettings>,
    scheme: SigningScheme,
    protocol: AzureProtocol,
    retry: RetryPolicy,
    pipeline: Pipeline<Credential>,
}

impl Client {
    /// Create a client signing with `SharedKey` and the default retry policy.
    pub fn new(ctx: Context, settings: AccountSettings) -> Self {
        let settings = Arc::new(settings);
        let scheme = SigningScheme::default();
        let protocol = AzureProtocol::default();
        let retry = RetryPolicy::default();
        let pipeline = build_pipeline(&ctx, &settings, scheme, &protocol, &retry);

        Self {
            ctx,
            settings,
            scheme,
            protocol,
            retry,
            pipeline,
        }
    }

    /// Create a client from the environment of `ctx`.
    pub fn from_env(ctx: Context) -> Result<Self> {
        let settings = Config::default().from_env(&ctx).into_settings()?;
        Ok(Self::new(ctx, settings))
    }

    /// Sign with another scheme.
    pub fn with_scheme(mut self, scheme: SigningScheme) -> Self {
        self.scheme = scheme;
        self.rebuild()
    }

    /// Send another `x-ms-version`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.protocol = self.protocol.with_version(version);
        self.rebuild()
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self.rebuild()
    }

    fn rebuild(mut self) -> Self {
        self.pipeline = build_pipeline(
            &self.ctx,
            &self.settings,
            self.scheme,
            &self.protocol,
            &self.retry,
        );
        self
    }

    /// Get the account settings.
    pub fn settings(&self) -> Arc<AccountSettings> {
        self.settings.clone()
    }

    /// Get the pipeline requests go through.
    pub fn pipeline(&self) -> &Pipeline<Credential> {
        &self.pipeline
    }

    /// Execute any operation.
    pub async fn execute<O: Operation>(&self, op: &O) -> Result<O::Output> {
        self.pipeline.execute(op).await
    }

    /// Upload `data` as a block blob, staging blocks when it is large.
    pub async fn upload(
        &self,
        container: &str,
        blob: &str,
        data: Bytes,
        options: UploadOptions,
    ) -> Result<UploadOutcome> {
        BlockUploadCoordinator::new(self.pipeline.clone(), self.settings.clone(), options)?
            .upload(container, blob, data)
            .await
    }

    /// List the blocks of a blob.
    pub async fn get_block_list(&self, container: &str, blob: &str) -> Result<GetBlockListResponse> {
        self.execute(&GetBlockList::new(self.settings(), container, blob)?)
            .await
    }

    /// Delete a blob.
    pub async fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        self.execute(&DeleteBlob::new(self.settings(), container, blob)?)
            .await?;
        Ok(())
    }

    /// Add a message to a queue.
    pub async fn put_message(&self, queue: &str, text: &str) -> Result<PutMessageResponse> {
        self.execute(&PutMessage::new(self.settings(), queue, text)?)
            .await
    }

    /// List the tables of the account.
    pub async fn query_tables(&self) -> Result<QueryTablesResponse> {
        self.execute(&QueryTables::new(self.settings())).await
    }
}

fn build_pipeline(
    ctx: &Context,
    settings: &AccountSettings,
    scheme: SigningScheme,
    protocol: &AzureProtocol,
    retry: &RetryPolicy,
) -> Pipeline<Credential> {
    let signer = Signer::new(
        ctx.clone(),
        StaticCredentialProvider::from(Credential::from(settings)),
        RequestSigner::new().with_scheme(scheme),
    );
    Pipeline::new(signer, protocol.clone()).with_retry(retry.clone())
}
