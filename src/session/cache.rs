//! Pure chat session state
//!
//! Every mutation goes through a ticket captured when the request is issued,
//! so a result is always applied to the contact it was fetched for, even if
//! the active contact changed while the request was in flight. No I/O
//! happens here; `ChatSession` drives the transport and feeds results back.

use super::view::ChatView;
use crate::transport::{ChatError, Contact, Message, MessageId};
use std::collections::HashMap;

/// How a message fetch relates to the cached history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Latest page from the start; replaces the cached list
    Initial,
    /// Messages after the contact's cursor; appended to the cached list
    Incremental,
}

/// Request context captured at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub contact_id: String,
    pub mode: FetchMode,
    /// Exclusive lower bound sent to the backend (0 = from start)
    pub after_id: MessageId,
    epoch: u64,
}

/// Send context captured at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    pub contact_id: String,
    /// Trimmed text that goes over the wire
    pub content: String,
}

/// What applying a fetch result did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// History replaced by `count` messages
    Replaced { count: usize },
    /// `count` new messages appended (may be 0)
    Appended { count: usize },
    /// Result superseded by a newer reload and dropped
    Stale,
    /// Background fetch failed; error logged and swallowed
    Failed,
}

impl FetchOutcome {
    /// Whether the visible history of the fetched contact changed
    pub fn changed(self) -> bool {
        match self {
            Self::Replaced { .. } => true,
            Self::Appended { count } => count > 0,
            Self::Stale | Self::Failed => false,
        }
    }
}

/// Per-contact load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactLoadState {
    Unloaded,
    Loading(FetchMode),
    Loaded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ContactHistory {
    messages: Vec<Message>,
    last_seen_id: Option<MessageId>,
    /// Bumped whenever a full reload is issued
    epoch: u64,
    loaded: bool,
    initial_in_flight: usize,
    incremental_in_flight: usize,
}

impl ContactHistory {
    fn cursor(&self) -> MessageId {
        self.last_seen_id.unwrap_or(0)
    }

    fn finish(&mut self, mode: FetchMode) {
        let counter = match mode {
            FetchMode::Initial => &mut self.initial_in_flight,
            FetchMode::Incremental => &mut self.incremental_in_flight,
        };
        *counter = counter.saturating_sub(1);
    }

    /// Insert a message at its sorted position; false if the id is present
    fn insert_sorted(&mut self, message: Message) -> bool {
        match self.messages.binary_search_by_key(&message.id, |m| m.id) {
            Ok(_) => false,
            Err(pos) => {
                self.messages.insert(pos, message);
                true
            }
        }
    }

    /// Merge a page fetched after `after_id`.
    ///
    /// Ids at or below `after_id` and ids already cached are skipped; the
    /// rest are inserted in order. The cursor moves to the page's last id
    /// when that is past `after_id`, and never moves backwards.
    fn merge_after(&mut self, after_id: MessageId, incoming: Vec<Message>) -> usize {
        let last_id = incoming.last().map(|m| m.id);
        let mut inserted = 0;
        for message in incoming {
            if message.id > after_id && self.insert_sorted(message) {
                inserted += 1;
            }
        }
        if let Some(last_id) = last_id.filter(|id| *id > after_id) {
            self.last_seen_id = Some(last_id.max(self.cursor()));
        }
        inserted
    }
}

/// Contacts, per-contact histories and cursors, and the active contact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCache {
    contacts: Vec<Contact>,
    active_contact_id: Option<String>,
    histories: HashMap<String, ContactHistory>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == contact_id)
    }

    pub fn active_contact_id(&self) -> Option<&str> {
        self.active_contact_id.as_deref()
    }

    /// Ordered history for a contact (empty if never loaded)
    pub fn messages(&self, contact_id: &str) -> &[Message] {
        self.histories
            .get(contact_id)
            .map(|h| h.messages.as_slice())
            .unwrap_or_default()
    }

    /// Highest message id fetched so far for a contact
    pub fn last_seen_id(&self, contact_id: &str) -> Option<MessageId> {
        self.histories.get(contact_id).and_then(|h| h.last_seen_id)
    }

    #[allow(dead_code)] // Inspection API used by tests
    pub fn load_state(&self, contact_id: &str) -> ContactLoadState {
        match self.histories.get(contact_id) {
            None => ContactLoadState::Unloaded,
            Some(h) if h.initial_in_flight > 0 => ContactLoadState::Loading(FetchMode::Initial),
            Some(h) if h.incremental_in_flight > 0 => {
                ContactLoadState::Loading(FetchMode::Incremental)
            }
            Some(h) if h.loaded => ContactLoadState::Loaded,
            Some(_) => ContactLoadState::Unloaded,
        }
    }

    /// Snapshot for the renderer
    pub fn view(&self) -> ChatView {
        ChatView::build(self)
    }

    // ------------------------------------------------------------------
    // Contacts and active contact
    // ------------------------------------------------------------------

    /// Replace the contact list. Histories are untouched; the active contact
    /// is cleared if it is no longer listed.
    pub fn replace_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
        if let Some(active) = self.active_contact_id.as_deref() {
            if self.contact(active).is_none() {
                tracing::info!(contact_id = %active, "Active contact no longer listed");
                self.active_contact_id = None;
            }
        }
    }

    pub fn set_active(&mut self, contact_id: &str) -> Result<(), ChatError> {
        if self.contact(contact_id).is_none() {
            return Err(ChatError::validation(format!("Unknown contact: {contact_id}")));
        }
        self.active_contact_id = Some(contact_id.to_string());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Message fetches
    // ------------------------------------------------------------------

    /// Capture the request context for a message fetch
    pub fn begin_fetch(&mut self, contact_id: &str, mode: FetchMode) -> FetchTicket {
        let history = self.histories.entry(contact_id.to_string()).or_default();
        let after_id = match mode {
            FetchMode::Initial => {
                history.epoch += 1;
                history.initial_in_flight += 1;
                0
            }
            FetchMode::Incremental => {
                history.incremental_in_flight += 1;
                history.cursor()
            }
        };
        FetchTicket {
            contact_id: contact_id.to_string(),
            mode,
            after_id,
            epoch: history.epoch,
        }
    }

    /// Apply a successful fetch to the contact captured in the ticket
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, mut messages: Vec<Message>) -> FetchOutcome {
        let history = self.histories.entry(ticket.contact_id.clone()).or_default();
        history.finish(ticket.mode);

        if ticket.epoch != history.epoch {
            return FetchOutcome::Stale;
        }

        match ticket.mode {
            FetchMode::Initial => {
                messages.sort_by_key(|m| m.id);
                messages.dedup_by_key(|m| m.id);
                history.last_seen_id = messages.last().map(|m| m.id).or(history.last_seen_id);
                let count = messages.len();
                history.messages = messages;
                history.loaded = true;
                FetchOutcome::Replaced { count }
            }
            FetchMode::Incremental => {
                let count = history.merge_after(ticket.after_id, messages);
                history.loaded = true;
                FetchOutcome::Appended { count }
            }
        }
    }

    /// Release the ticket of a failed fetch without touching history
    pub fn abort_fetch(&mut self, ticket: &FetchTicket) {
        if let Some(history) = self.histories.get_mut(&ticket.contact_id) {
            history.finish(ticket.mode);
        }
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Validate a send and capture the active contact
    pub fn begin_send(&self, text: &str) -> Result<SendTicket, ChatError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ChatError::validation("Message text is empty"));
        }
        let contact_id = self
            .active_contact_id
            .clone()
            .ok_or_else(|| ChatError::validation("No active contact"))?;
        Ok(SendTicket {
            contact_id,
            content: content.to_string(),
        })
    }

    /// Record the backend-persisted message for a completed send
    pub fn apply_sent(&mut self, ticket: &SendTicket, message: Message) {
        let history = self.histories.entry(ticket.contact_id.clone()).or_default();
        history.loaded = true;

        if message.id > history.cursor() {
            history.last_seen_id = Some(message.id);
            history.messages.push(message);
            return;
        }

        // A poll overtook the send response
        history.insert_sorted(message);
    }
}
