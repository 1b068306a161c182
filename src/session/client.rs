//! Async operations over the session cache
//!
//! Each operation captures its ticket under the lock, releases the lock for
//! the transport call, then re-locks to apply the result. The lock is never
//! held across an await.

use super::cache::{FetchMode, FetchOutcome, SessionCache};
use super::view::ChatView;
use crate::transport::{ChatError, ChatTransport, Contact, Message};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Chat session driving a transport
pub struct ChatSession<T: ChatTransport> {
    transport: T,
    cache: Mutex<SessionCache>,
    page_limit: u32,
}

impl<T: ChatTransport> ChatSession<T> {
    pub fn new(transport: T, page_limit: u32) -> Self {
        Self {
            transport,
            cache: Mutex::new(SessionCache::new()),
            page_limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionCache> {
        // Cache mutations never panic midway, so a poisoned lock still holds
        // consistent state
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current cache state
    #[allow(dead_code)] // Inspection API used by tests
    pub fn snapshot(&self) -> SessionCache {
        self.lock().clone()
    }

    pub fn view(&self) -> ChatView {
        self.lock().view()
    }

    pub fn active_contact_id(&self) -> Option<String> {
        self.lock().active_contact_id().map(str::to_string)
    }

    /// Fetch and replace the contact list.
    ///
    /// On failure the previous list is kept and the error is returned.
    pub async fn load_contacts(&self) -> Result<Vec<Contact>, ChatError> {
        match self.transport.list_contacts().await {
            Ok(contacts) => {
                tracing::info!(count = contacts.len(), "Loaded chat contacts");
                self.lock().replace_contacts(contacts.clone());
                Ok(contacts)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load chat contacts; keeping previous list");
                Err(e)
            }
        }
    }

    /// Fetch messages for a contact.
    ///
    /// `initial` reloads the latest page and replaces the cached history;
    /// otherwise only messages after the contact's cursor are fetched and
    /// appended. Errors are returned for initial loads and swallowed for
    /// incremental ones, which report [`FetchOutcome::Failed`] instead.
    pub async fn load_messages(
        &self,
        contact_id: &str,
        initial: bool,
    ) -> Result<FetchOutcome, ChatError> {
        let mode = if initial {
            FetchMode::Initial
        } else {
            FetchMode::Incremental
        };
        let ticket = self.lock().begin_fetch(contact_id, mode);

        let result = self
            .transport
            .list_messages(&ticket.contact_id, ticket.after_id, self.page_limit)
            .await;

        match result {
            Ok(messages) => {
                let outcome = self.lock().apply_fetch(&ticket, messages);
                tracing::debug!(
                    contact_id = %ticket.contact_id,
                    after_id = ticket.after_id,
                    outcome = ?outcome,
                    "Applied message fetch"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.lock().abort_fetch(&ticket);
                match mode {
                    FetchMode::Initial => {
                        tracing::warn!(contact_id = %ticket.contact_id, error = %e, "Failed to load messages");
                        Err(e)
                    }
                    FetchMode::Incremental => {
                        tracing::debug!(contact_id = %ticket.contact_id, error = %e, "Background refresh failed");
                        Ok(FetchOutcome::Failed)
                    }
                }
            }
        }
    }

    /// Make a contact active and reload its full history
    pub async fn switch_active(&self, contact_id: &str) -> Result<FetchOutcome, ChatError> {
        self.lock().set_active(contact_id)?;
        tracing::info!(contact_id, "Switched active contact");
        self.load_messages(contact_id, true).await
    }

    /// Send text to the active contact and append the persisted message
    pub async fn send_message(&self, text: &str) -> Result<Message, ChatError> {
        let ticket = self.lock().begin_send(text)?;

        let message = self
            .transport
            .send_message(&ticket.contact_id, &ticket.content)
            .await
            .inspect_err(|e| {
                tracing::warn!(contact_id = %ticket.contact_id, error = %e, "Failed to send message");
            })?;

        self.lock().apply_sent(&ticket, message.clone());
        tracing::info!(contact_id = %ticket.contact_id, message_id = message.id, "Message sent");
        Ok(message)
    }

    /// Load contacts, then open the first one
    pub async fn start(&self) -> Result<(), ChatError> {
        let contacts = self.load_contacts().await?;
        let Some(first) = contacts.first() else {
            tracing::info!("No chat contacts available");
            return Ok(());
        };
        self.lock().set_active(&first.id)?;
        self.load_messages(&first.id, true).await?;
        Ok(())
    }

    /// One background refresh of the active contact.
    ///
    /// Returns the contact polled with the outcome, or `None` when no contact
    /// is active.
    pub async fn poll(&self) -> Option<(String, FetchOutcome)> {
        let contact_id = self.active_contact_id()?;
        // Incremental loads swallow their errors
        let outcome = self
            .load_messages(&contact_id, false)
            .await
            .unwrap_or(FetchOutcome::Failed);
        Some((contact_id, outcome))
    }
}
