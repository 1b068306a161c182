//! HTTP transport for the chat backend

use super::envelope::{decode_envelope, decode_list, decode_one};
use super::{ChatError, ChatTransport, Contact, Message, MessageId, SendMessageRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

/// Talks to `/api/chat/*` on a backend base URL
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ChatError::validation(format!("Invalid base URL {base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ChatError::validation(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Build `<base>/api/chat/<segments..>`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so segments are always editable
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "chat"]).extend(segments);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ChatError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::transport(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                ChatError::transport(format!("Connection failed: {e}"))
            } else {
                ChatError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::transport(format!("Failed to read response: {e}")))?;

        decode_envelope(status.as_u16(), &body)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatError> {
        let request = self.client.get(self.endpoint(&["contacts"]));
        decode_list(self.execute(request).await?)
    }

    async fn list_messages(
        &self,
        contact_id: &str,
        after_id: MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        let mut query: Vec<(&str, String)> = Vec::with_capacity(2);
        if after_id > 0 {
            query.push(("after_id", after_id.to_string()));
        }
        query.push(("limit", limit.to_string()));

        let request = self
            .client
            .get(self.endpoint(&["messages", contact_id]))
            .query(&query);
        decode_list(self.execute(request).await?)
    }

    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, ChatError> {
        let request = self
            .client
            .post(self.endpoint(&["messages", contact_id]))
            .json(&SendMessageRequest { content });
        decode_one(self.execute(request).await?)
    }
}
