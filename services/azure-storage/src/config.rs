use std::fmt::{Debug, Formatter};

use storwire_core::utils::Redact;
use storwire_core::{Context, Error, Result};

use crate::constants::*;
use crate::{AccountSettings, Service};

/// Config carries all the configuration for Azure Storage services.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_ACCOUNT_NAME`
    /// - env value: `AZURE_STORAGE_ACCOUNT_NAME`
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_ACCOUNT_KEY`
    /// - env value: `AZURE_STORAGE_ACCOUNT_KEY`
    pub account_key: Option<String>,
    /// `blob_endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_BLOB_ENDPOINT`
    pub blob_endpoint: Option<String>,
    /// `queue_endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_QUEUE_ENDPOINT`
    pub queue_endpoint: Option<String>,
    /// `table_endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_TABLE_ENDPOINT`
    pub table_endpoint: Option<String>,
    /// Use plain http for the default endpoints.
    ///
    /// - this field if it's `is_some`
    /// - env value: `STORWIRE_AZURE_USE_HTTP`, `true`, `1` or `on`
    pub use_http: Option<bool>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(Redact::from))
            .field("blob_endpoint", &self.blob_endpoint)
            .field("queue_endpoint", &self.queue_endpoint)
            .field("table_endpoint", &self.table_endpoint)
            .field("use_http", &self.use_http)
            .finish()
    }
}

impl Config {
    /// Fill unset fields from the environment of `ctx`.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if self.account_name.is_none() {
            self.account_name = envs
                .get(STORWIRE_AZURE_ACCOUNT_NAME)
                .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_NAME))
                .cloned();
        }
        if self.account_key.is_none() {
            self.account_key = envs
                .get(STORWIRE_AZURE_ACCOUNT_KEY)
                .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_KEY))
                .cloned();
        }
        if self.blob_endpoint.is_none() {
            self.blob_endpoint = envs.get(STORWIRE_AZURE_BLOB_ENDPOINT).cloned();
        }
        if self.queue_endpoint.is_none() {
            self.queue_endpoint = envs.get(STORWIRE_AZURE_QUEUE_ENDPOINT).cloned();
        }
        if self.table_endpoint.is_none() {
            self.table_endpoint = envs.get(STORWIRE_AZURE_TABLE_ENDPOINT).cloned();
        }
        if self.use_http.is_none() {
            self.use_http = envs
                .get(STORWIRE_AZURE_USE_HTTP)
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "on"));
        }

        self
    }

    /// Validate the config and turn it into account settings.
    pub fn into_settings(self) -> Result<AccountSettings> {
        let account_name = self
            .account_name
            .ok_or_else(|| Error::config_invalid("account name is not set"))?;
        let account_key = self
            .account_key
            .ok_or_else(|| Error::config_invalid("account key is not set"))?;

        let mut settings = AccountSettings::new(account_name, account_key)?;
        if self.use_http == Some(true) {
            settings = settings.with_http();
        }
        for (service, endpoint) in [
            (Service::Blob, self.blob_endpoint),
            (Service::Queue, self.queue_endpoint),
            (Service::Table, self.table_endpoint),
        ] {
            let Some(endpoint) = endpoint else {
                continue;
            };
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(Error::config_invalid(format!(
                    "{service} endpoint must be an absolute http(s) uri, got: {endpoint}"
                )));
            }
            settings = settings.with_endpoint(service, endpoint);
        }

        Ok(settings)
    }
}
