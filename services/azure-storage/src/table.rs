//! Table service operations.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, ACCEPT};
use http::{Extensions, HeaderMap, HeaderValue, Method};
use serde::Deserialize;
use storwire_core::operation::header_str;
use storwire_core::{Error, Operation, ReceiveResponse, Result, UriBuilder};

use crate::blob::require;
use crate::{AccountSettings, Service};

const NEXT_TABLE_NAME: &str = "x-ms-continuation-nexttablename";

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct QueryTablesDocument {
    value: Vec<TableEntry>,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct TableEntry {
    #[serde(rename = "TableName")]
    table_name: String,
}

/// Response of [`QueryTables`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryTablesResponse {
    /// Names of the returned tables.
    pub tables: Vec<String>,
    /// Continuation token, present when more tables are available.
    pub next_table_name: Option<String>,
}

impl ReceiveResponse for QueryTablesResponse {
    const EXPECTS_BODY: bool = true;

    fn expected_content_type() -> Option<&'static str> {
        Some("application/json")
    }

    fn receive_headers(&mut self, headers: &HeaderMap) -> Result<()> {
        self.next_table_name = header_str(headers, NEXT_TABLE_NAME).map(str::to_string);
        Ok(())
    }

    fn receive_body(&mut self, body: Bytes, _: Option<&str>) -> Result<()> {
        let doc: QueryTablesDocument = serde_json::from_slice(&body)
            .map_err(|e| Error::parse("failed to parse table list").with_source(e))?;
        self.tables = doc.value.into_iter().map(|v| v.table_name).collect();
        Ok(())
    }
}

/// List the tables of an account.
///
/// - [Query Tables](https://learn.microsoft.com/en-us/rest/api/storageservices/query-tables)
#[derive(Debug, Clone)]
pub struct QueryTables {
    settings: Arc<AccountSettings>,
    filter: Option<String>,
    top: Option<u32>,
    next_table_name: Option<String>,
}

impl QueryTables {
    /// Create a query tables operation listing every table.
    pub fn new(settings: Arc<AccountSettings>) -> Self {
        Self {
            settings,
            filter: None,
            top: None,
            next_table_name: None,
        }
    }

    /// Only return tables matching an OData filter, e.g. `TableName eq 'logs'`.
    pub fn with_filter(mut self, filter: &str) -> Result<Self> {
        require("table filter", filter)?;
        self.filter = Some(filter.to_string());
        Ok(self)
    }

    /// Return at most `top` tables, between 1 and 1000.
    pub fn with_top(mut self, top: u32) -> Result<Self> {
        if !(1..=1000).contains(&top) {
            return Err(Error::request_invalid(format!(
                "top must be between 1 and 1000, got {top}"
            )));
        }
        self.top = Some(top);
        Ok(self)
    }

    /// Continue listing from a previous response.
    pub fn with_next_table_name(mut self, table_name: &str) -> Result<Self> {
        require("table name", table_name)?;
        self.next_table_name = Some(table_name.to_string());
        Ok(self)
    }
}

impl Operation for QueryTables {
    type Output = QueryTablesResponse;

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self) -> UriBuilder {
        self.settings
            .uri(Service::Table)
            .push_segment("Tables")
            .push_query_opt("$filter", self.filter.clone())
            .push_query_opt("$top", self.top.map(|v| v.to_string()))
            .push_query_opt("NextTableName", self.next_table_name.clone())
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json;odata=nometadata"),
        );
        headers.insert(
            HeaderName::from_static("dataserviceversion"),
            HeaderValue::from_static("3.0;NetFx"),
        );
        Ok(())
    }

    fn extensions(&self, extensions: &mut Extensions) {
        extensions.insert(Service::Table);
    }
}
