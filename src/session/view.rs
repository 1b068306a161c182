//! Renderer-facing snapshot of the session
//!
//! Content is passed through verbatim; escaping belongs to whatever surface
//! draws the view.

use super::cache::SessionCache;
use crate::transport::{Contact, ContactStatus, Message};

/// Contacts shown in the "recent" section; the rest go under "all"
pub const RECENT_CONTACTS: usize = 3;

/// Previews longer than this are cut and suffixed with `...`
pub const PREVIEW_CHARS: usize = 22;

/// One row of the contact list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub avatar: char,
    pub status: ContactStatus,
    pub preview: Option<String>,
    pub active: bool,
}

/// Header of the open conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHeader {
    pub contact_id: String,
    pub name: String,
    pub avatar: char,
    pub status: ContactStatus,
}

impl ChatHeader {
    pub fn status_text(&self) -> &'static str {
        self.status.label()
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub active_contact_id: Option<String>,
    pub recent: Vec<ContactSummary>,
    pub all: Vec<ContactSummary>,
    /// Active contact, or the first contact when none is active
    pub header: Option<ChatHeader>,
    /// Ordered history of the active contact
    pub messages: Vec<Message>,
}

impl ChatView {
    pub(super) fn build(cache: &SessionCache) -> Self {
        let active = cache.active_contact_id();
        let summaries: Vec<ContactSummary> = cache
            .contacts()
            .iter()
            .map(|c| summarize(c, active == Some(c.id.as_str())))
            .collect();
        let split = summaries.len().min(RECENT_CONTACTS);
        let mut recent = summaries;
        let all = recent.split_off(split);

        let header = active
            .and_then(|id| cache.contact(id))
            .or_else(|| cache.contacts().first())
            .map(|c| ChatHeader {
                contact_id: c.id.clone(),
                name: c.name.clone(),
                avatar: avatar_initial(&c.name),
                status: c.status,
            });

        let messages = active.map(|id| cache.messages(id).to_vec()).unwrap_or_default();

        Self {
            active_contact_id: active.map(str::to_string),
            recent,
            all,
            header,
            messages,
        }
    }
}

fn summarize(contact: &Contact, active: bool) -> ContactSummary {
    ContactSummary {
        id: contact.id.clone(),
        name: contact.name.clone(),
        avatar: avatar_initial(&contact.name),
        status: contact.status,
        preview: contact.last_message_preview.as_deref().map(truncate_preview),
        active,
    }
}

/// First character of the trimmed name, upper-cased; `?` when empty
pub fn avatar_initial(name: &str) -> char {
    name.trim()
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

pub fn truncate_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
