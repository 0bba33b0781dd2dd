// Headers used in azure services.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";
pub const X_MS_BLOB_CONTENT_TYPE: &str = "x-ms-blob-content-type";
pub const X_MS_BLOB_CONTENT_MD5: &str = "x-ms-blob-content-md5";
pub const X_MS_BLOB_CACHE_CONTROL: &str = "x-ms-blob-cache-control";
pub const X_MS_META_PREFIX: &str = "x-ms-meta-";
pub const X_MS_LEASE_ACTION: &str = "x-ms-lease-action";
pub const X_MS_LEASE_DURATION: &str = "x-ms-lease-duration";
pub const X_MS_LEASE_ID: &str = "x-ms-lease-id";
pub const X_MS_PROPOSED_LEASE_ID: &str = "x-ms-proposed-lease-id";
pub const X_MS_DELETE_SNAPSHOTS: &str = "x-ms-delete-snapshots";
pub const X_MS_ERROR_CODE: &str = "x-ms-error-code";
pub const X_MS_REQUEST_ID: &str = "x-ms-request-id";
pub const X_MS_REQUEST_SERVER_ENCRYPTED: &str = "x-ms-request-server-encrypted";
pub const X_MS_BLOB_CONTENT_LENGTH: &str = "x-ms-blob-content-length";
pub const CONTENT_MD5: &str = "content-md5";

// Service version sent with every request.
pub const AZURE_VERSION: &str = "2019-12-12";

// Placeholders used when the service error document lacks a field.
pub const NOT_PROVIDED: &str = "NotProvided";
pub const UNKNOWN_ERROR_CODE: &str = "Unknown";

// Env values used to load account settings.
pub const STORWIRE_AZURE_ACCOUNT_NAME: &str = "STORWIRE_AZURE_ACCOUNT_NAME";
pub const STORWIRE_AZURE_ACCOUNT_KEY: &str = "STORWIRE_AZURE_ACCOUNT_KEY";
pub const STORWIRE_AZURE_BLOB_ENDPOINT: &str = "STORWIRE_AZURE_BLOB_ENDPOINT";
pub const STORWIRE_AZURE_QUEUE_ENDPOINT: &str = "STORWIRE_AZURE_QUEUE_ENDPOINT";
pub const STORWIRE_AZURE_TABLE_ENDPOINT: &str = "STORWIRE_AZURE_TABLE_ENDPOINT";
pub const STORWIRE_AZURE_USE_HTTP: &str = "STORWIRE_AZURE_USE_HTTP";
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
