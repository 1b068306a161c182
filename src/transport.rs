//! Transport to the chat backend
//!
//! Provides a common interface over the three chat endpoints so the session
//! cache can be driven by the HTTP client in production and by mocks in tests.

mod envelope;
mod error;
mod http;
mod types;


pub use error::{ChatError, ChatErrorKind};
pub use http::HttpTransport;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Common interface for the chat backend
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `GET /api/chat/contacts`
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatError>;

    /// `GET /api/chat/messages/{contact_id}?after_id=..&limit=..`
    ///
    /// `after_id == 0` means "from the start". Results are ascending by id.
    async fn list_messages(
        &self,
        contact_id: &str,
        after_id: MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError>;

    /// `POST /api/chat/messages/{contact_id}`; returns the persisted message
    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, ChatError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatError> {
        (**self).list_contacts().await
    }

    async fn list_messages(
        &self,
        contact_id: &str,
        after_id: MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        (**self).list_messages(contact_id, after_id, limit).await
    }

    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, ChatError> {
        (**self).send_message(contact_id, content).await
    }
}

/// Logging wrapper for chat transports
pub struct LoggingTransport {
    inner: Arc<dyn ChatTransport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ChatTransport>) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(
    operation: &'static str,
    contact_id: Option<&str>,
    started: Instant,
    result: &Result<T, ChatError>,
    count: impl Fn(&T) -> usize,
) {
    let duration_ms = started.elapsed().as_millis();
    let contact_id = contact_id.unwrap_or("-");
    match result {
        Ok(value) => {
            tracing::debug!(
                operation,
                contact_id,
                duration_ms = %duration_ms,
                count = count(value),
                "Chat request completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                operation,
                contact_id,
                duration_ms = %duration_ms,
                kind = e.kind.as_str(),
                status = ?e.status,
                transient = e.kind.is_transient(),
                error = %e.message,
                "Chat request failed"
            );
        }
    }
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatError> {
        let started = Instant::now();
        let result = self.inner.list_contacts().await;
        log_outcome("list_contacts", None, started, &result, Vec::len);
        result
    }

    async fn list_messages(
        &self,
        contact_id: &str,
        after_id: MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        let started = Instant::now();
        let result = self.inner.list_messages(contact_id, after_id, limit).await;
        log_outcome("list_messages", Some(contact_id), started, &result, Vec::len);
        result
    }

    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, ChatError> {
        let started = Instant::now();
        let result = self.inner.send_message(contact_id, content).await;
        log_outcome("send_message", Some(contact_id), started, &result, |_| 1);
        result
    }
}
