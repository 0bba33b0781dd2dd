use std::fmt::{Debug, Display, Formatter};

use storwire_core::hash::base64_decode;
use storwire_core::utils::Redact;
use storwire_core::{Error, Result, UriBuilder};

/// Service family of an endpoint.
///
/// The family decides which canonicalization rule the signer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Blob service.
    Blob,
    /// Queue service.
    Queue,
    /// Table service.
    Table,
}

impl Service {
    /// Name used in the default endpoint host.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Blob => "blob",
            Service::Queue => "queue",
            Service::Table => "table",
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account settings shared by every operation of an account.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountSettings {
    account_name: String,
    account_key: String,
    use_https: bool,
    blob_endpoint: Option<String>,
    queue_endpoint: Option<String>,
    table_endpoint: Option<String>,
}

impl Debug for AccountSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSettings")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("use_https", &self.use_https)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("queue_endpoint", &self.queue_endpoint)
            .field("table_endpoint", &self.table_endpoint)
            .finish()
    }
}

impl AccountSettings {
    /// Create settings for the public cloud endpoints of an account, over https.
    ///
    /// The account key must be the base64 encoded key shown by the portal.
    pub fn new(account_name: impl Into<String>, account_key: impl Into<String>) -> Result<Self> {
        let account_name = account_name.into();
        let account_key = account_key.into();

        if account_name.is_empty() {
            return Err(Error::config_invalid("account name must not be empty"));
        }
        if account_key.is_empty() {
            return Err(Error::credential_invalid("account key must not be empty"));
        }
        base64_decode(&account_key)?;

        Ok(Self {
            account_name,
            account_key,
            use_https: true,
            blob_endpoint: None,
            queue_endpoint: None,
            table_endpoint: None,
        })
    }

    /// Use plain http for the default endpoints.
    pub fn with_http(mut self) -> Self {
        self.use_https = false;
        self
    }

    /// Override the endpoint root of one service, for example to talk to an emulator.
    pub fn with_endpoint(mut self, service: Service, endpoint: impl Into<String>) -> Self {
        let endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        match service {
            Service::Blob => self.blob_endpoint = endpoint,
            Service::Queue => self.queue_endpoint = endpoint,
            Service::Table => self.table_endpoint = endpoint,
        }
        self
    }

    /// Get the account name.
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Get the base64 encoded account key.
    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// Whether default endpoints use https.
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Endpoint root of given service.
    pub fn endpoint(&self, service: Service) -> String {
        let custom = match service {
            Service::Blob => &self.blob_endpoint,
            Service::Queue => &self.queue_endpoint,
            Service::Table => &self.table_endpoint,
        };
        match custom {
            Some(v) => v.clone(),
            None => format!(
                "{}://{}.{}.core.windows.net",
                if self.use_https { "https" } else { "http" },
                self.account_name,
                service
            ),
        }
    }

    /// Start a uri for given service.
    pub fn uri(&self, service: Service) -> UriBuilder {
        UriBuilder::new(self.endpoint(service))
    }
}
