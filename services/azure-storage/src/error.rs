use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use storwire_core::operation::header_str;
use storwire_core::ServiceErrorDetail;

use crate::constants::*;

/// Error document returned by the blob and queue services.
///
/// ```xml
/// <?xml version="1.0" encoding="utf-8"?>
/// <Error>
///   <Code>BlobNotFound</Code>
///   <Message>The specified blob does not exist.</Message>
/// </Error>
/// ```
#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlErrorDocument {
    code: Option<String>,
    message: Option<String>,
}

/// Error document returned by the table service.
#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct JsonErrorDocument {
    #[serde(rename = "odata.error")]
    error: JsonError,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct JsonError {
    code: Option<String>,
    message: Option<JsonMessage>,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct JsonMessage {
    value: Option<String>,
}

/// Parse a non-success response into a [`ServiceErrorDetail`].
///
/// Never fails. Missing fields become `NotProvided`; a body that is not an error
/// document yields the code `Unknown` and keeps the raw body as message. The
/// `x-ms-error-code` header fills in the code when the body lacks one.
pub fn parse_error_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ServiceErrorDetail {
    let header_code = header_str(headers, X_MS_ERROR_CODE).map(str::to_string);
    let text = String::from_utf8_lossy(body);
    let text = text.trim_start_matches('\u{feff}').trim();

    let is_json = header_str(headers, CONTENT_TYPE.as_str()).is_some_and(|v| v.contains("json"))
        || text.starts_with('{');

    let parsed = if text.is_empty() {
        None
    } else if is_json {
        serde_json::from_str::<JsonErrorDocument>(text)
            .ok()
            .map(|doc| (doc.error.code, doc.error.message.and_then(|m| m.value)))
    } else if text.starts_with('<') {
        quick_xml::de::from_str::<XmlErrorDocument>(text)
            .ok()
            .map(|doc| (doc.code, doc.message))
    } else {
        None
    };

    let (code, message) = match parsed {
        Some((code, message)) => (
            code.or(header_code)
                .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            message.unwrap_or_else(|| NOT_PROVIDED.to_string()),
        ),
        None => (
            header_code.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
            if text.is_empty() {
                NOT_PROVIDED.to_string()
            } else {
                text.to_string()
            },
        ),
    };

    ServiceErrorDetail {
        status,
        code,
        message,
    }
}
