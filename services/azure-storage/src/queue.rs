//! Queue service operations.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Extensions, HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use storwire_core::{Error, Operation, ReceiveResponse, Result, UriBuilder};

use crate::blob::require;
use crate::{AccountSettings, Service};

/// Longest visibility timeout accepted by the service: seven days.
const MAX_VISIBILITY_TIMEOUT: u32 = 7 * 24 * 60 * 60;

#[derive(Debug, Serialize)]
#[serde(rename = "QueueMessage", rename_all = "PascalCase")]
struct QueueMessageDocument<'a> {
    message_text: &'a str,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct QueueMessagesList {
    queue_message: Vec<EnqueuedMessage>,
}

/// Message as reported back after it was enqueued.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EnqueuedMessage {
    /// Id of the message.
    pub message_id: String,
    /// Time the message was added, as sent by the service.
    pub insertion_time: String,
    /// Time the message expires, as sent by the service.
    pub expiration_time: String,
    /// Receipt needed to delete or update the message.
    pub pop_receipt: String,
    /// Time the message becomes visible, as sent by the service.
    pub time_next_visible: String,
}

/// Response of [`PutMessage`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PutMessageResponse {
    /// The enqueued message.
    pub message: EnqueuedMessage,
}

impl ReceiveResponse for PutMessageResponse {
    const EXPECTS_BODY: bool = true;

    fn expected_content_type() -> Option<&'static str> {
        Some("application/xml")
    }

    fn receive_body(&mut self, body: Bytes, _: Option<&str>) -> Result<()> {
        let text = std::str::from_utf8(&body)
            .map_err(|e| Error::parse("queue response is not valid utf-8").with_source(e))?;
        let list: QueueMessagesList = quick_xml::de::from_str(text.trim_start_matches('\u{feff}'))
            .map_err(|e| Error::parse("failed to parse queue message list").with_source(e))?;
        self.message = list
            .queue_message
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse("queue message list is empty"))?;
        Ok(())
    }
}

/// Add a message to the back of a queue.
///
/// - [Put Message](https://learn.microsoft.com/en-us/rest/api/storageservices/put-message)
#[derive(Debug, Clone)]
pub struct PutMessage {
    settings: Arc<AccountSettings>,
    queue: String,
    body: Bytes,
    visibility_timeout: Option<u32>,
    message_ttl: Option<i64>,
}

impl PutMessage {
    /// Create a put message operation.
    pub fn new(settings: Arc<AccountSettings>, queue: &str, text: &str) -> Result<Self> {
        require("queue name", queue)?;
        if queue.len() < 3
            || queue.len() > 63
            || !queue
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::request_invalid(format!(
                "queue name {queue:?} must be 3 to 63 lowercase letters, digits or dashes"
            )));
        }

        let body = quick_xml::se::to_string(&QueueMessageDocument { message_text: text })
            .map_err(|e| Error::unexpected("failed to serialize queue message").with_source(e))?;

        Ok(Self {
            settings,
            queue: queue.to_string(),
            body: Bytes::from(body),
            visibility_timeout: None,
            message_ttl: None,
        })
    }

    /// Keep the message invisible for given seconds, at most seven days.
    pub fn with_visibility_timeout(mut self, seconds: u32) -> Result<Self> {
        if seconds > MAX_VISIBILITY_TIMEOUT {
            return Err(Error::request_invalid(format!(
                "visibility timeout must be at most {MAX_VISIBILITY_TIMEOUT} seconds, got {seconds}"
            )));
        }
        self.visibility_timeout = Some(seconds);
        Ok(self)
    }

    /// Expire the message after given seconds; `-1` means never.
    pub fn with_message_ttl(mut self, seconds: i64) -> Result<Self> {
        if seconds == 0 || seconds < -1 {
            return Err(Error::request_invalid(format!(
                "message ttl must be -1 or positive, got {seconds}"
            )));
        }
        self.message_ttl = Some(seconds);
        Ok(self)
    }
}

impl Operation for PutMessage {
    type Output = PutMessageResponse;

    fn method(&self) -> Method {
        Method::POST
    }

    fn uri(&self) -> UriBuilder {
        self.settings
            .uri(Service::Queue)
            .push_segment(&self.queue)
            .push_segment("messages")
            .push_query_opt("visibilitytimeout", self.visibility_timeout.map(|v| v.to_string()))
            .push_query_opt("messagettl", self.message_ttl.map(|v| v.to_string()))
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
        Ok(())
    }

    fn body(&self) -> Option<Bytes> {
        Some(self.body.clone())
    }

    fn extensions(&self, extensions: &mut Extensions) {
        extensions.insert(Service::Queue);
    }
}
