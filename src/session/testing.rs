//! Mock transport for testing
//!
//! Replies are queued per endpoint and handed out in FIFO order. A reply can
//! be held back with a oneshot channel so tests control completion order.

use crate::transport::{ChatError, ChatTransport, Contact, Message, MessageId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

enum Reply<T> {
    Ready(Result<T, ChatError>),
    Held(oneshot::Receiver<Result<T, ChatError>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, ChatError> {
        match self {
            Reply::Ready(result) => result,
            Reply::Held(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ChatError::transport("Held reply dropped"))),
        }
    }
}

/// A recorded `list_messages` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub contact_id: String,
    pub after_id: MessageId,
    pub limit: u32,
}

/// Mock transport that returns queued replies
#[derive(Default)]
pub struct MockTransport {
    contacts: Mutex<VecDeque<Reply<Vec<Contact>>>>,
    messages: Mutex<VecDeque<Reply<Vec<Message>>>>,
    sends: Mutex<VecDeque<Reply<Message>>>,
    message_requests: Mutex<Vec<MessageRequest>>,
    send_requests: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_contacts(&self, reply: Result<Vec<Contact>, ChatError>) {
        self.contacts.lock().unwrap().push_back(Reply::Ready(reply));
    }

    pub fn queue_messages(&self, reply: Result<Vec<Message>, ChatError>) {
        self.messages.lock().unwrap().push_back(Reply::Ready(reply));
    }

    /// Queue a `list_messages` reply that completes when the sender fires
    pub fn hold_messages(&self) -> oneshot::Sender<Result<Vec<Message>, ChatError>> {
        let (tx, rx) = oneshot::channel();
        self.messages.lock().unwrap().push_back(Reply::Held(rx));
        tx
    }

    pub fn queue_send(&self, reply: Result<Message, ChatError>) {
        self.sends.lock().unwrap().push_back(Reply::Ready(reply));
    }

    /// Queue a `send_message` reply that completes when the sender fires
    pub fn hold_send(&self) -> oneshot::Sender<Result<Message, ChatError>> {
        let (tx, rx) = oneshot::channel();
        self.sends.lock().unwrap().push_back(Reply::Held(rx));
        tx
    }

    pub fn message_requests(&self) -> Vec<MessageRequest> {
        self.message_requests.lock().unwrap().clone()
    }

    /// Recorded `(contact_id, content)` pairs
    pub fn send_requests(&self) -> Vec<(String, String)> {
        self.send_requests.lock().unwrap().clone()
    }
}

fn next<T>(queue: &Mutex<VecDeque<Reply<T>>>, what: &str) -> Reply<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Reply::Ready(Err(ChatError::transport(format!("No mock {what} queued")))))
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn list_contacts(&self) -> Result<Vec<Contact>, ChatError> {
        next(&self.contacts, "contacts").resolve().await
    }

    async fn list_messages(
        &self,
        contact_id: &str,
        after_id: MessageId,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        // Record and dequeue together so request order matches reply order
        let reply = {
            let mut requests = self.message_requests.lock().unwrap();
            requests.push(MessageRequest {
                contact_id: contact_id.to_string(),
                after_id,
                limit,
            });
            next(&self.messages, "messages")
        };
        reply.resolve().await
    }

    async fn send_message(&self, contact_id: &str, content: &str) -> Result<Message, ChatError> {
        let reply = {
            let mut requests = self.send_requests.lock().unwrap();
            requests.push((contact_id.to_string(), content.to_string()));
            next(&self.sends, "send")
        };
        reply.resolve().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ContactStatus, Sender};

    #[tokio::test]
    async fn test_mock_returns_queued_replies_in_order() {
        let mock = MockTransport::new();
        mock.queue_contacts(Ok(vec![Contact::new("a", "A", ContactStatus::Away)]));

        let contacts = mock.list_contacts().await.unwrap();
        assert_eq!(contacts.len(), 1);

        // Second call should fail (nothing queued)
        assert!(mock.list_contacts().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockTransport::new();
        mock.queue_messages(Ok(vec![]));
        mock.queue_send(Ok(Message::new(1, Sender::Me, "x")));

        mock.list_messages("a", 3, 50).await.unwrap();
        mock.send_message("a", "x").await.unwrap();

        assert_eq!(
            mock.message_requests(),
            vec![MessageRequest {
                contact_id: "a".into(),
                after_id: 3,
                limit: 50
            }]
        );
        assert_eq!(mock.send_requests(), vec![("a".into(), "x".into())]);
    }

    #[tokio::test]
    async fn test_held_reply_waits_for_release() {
        let mock = std::sync::Arc::new(MockTransport::new());
        let tx = mock.hold_messages();

        let task = tokio::spawn({
            let mock = mock.clone();
            async move { mock.list_messages("a", 0, 50).await }
        });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        tx.send(Ok(vec![Message::new(9, Sender::Peer, "late")])).unwrap();
        let messages = task.await.unwrap().unwrap();
        assert_eq!(messages[0].id, 9);
    }
}
