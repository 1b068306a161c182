//! Wire types for the chat backend
//!
//! The backend serializes messages with Go-style field names (`ID`, `From`,
//! `Content`, `CreatedAt`); the lower-case spellings are accepted as well.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned message id, also used as the pagination cursor
pub type MessageId = u64;

/// Presence of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Online,
    Away,
    #[default]
    Offline,
}

impl ContactStatus {
    /// Unknown values are treated as offline
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "online" => Self::Online,
            "away" => Self::Away,
            _ => Self::Offline,
        }
    }

    /// Text shown in the conversation header
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Away => "Active 1h ago",
            Self::Offline => "Offline",
        }
    }
}

impl<'de> Deserialize<'de> for ContactStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Offline, Self::from_wire))
    }
}

/// A chat contact as listed by `GET /api/chat/contacts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(
        default,
        rename = "last_message",
        alias = "lastMessage",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message_preview: Option<String>,
}

impl Contact {
    #[allow(dead_code)] // Test and fixture constructor
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ContactStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            last_message_preview: None,
        }
    }
}

/// Author side of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// Sent from this console
    #[serde(rename = "self")]
    Me,
    /// Sent by the contact; the backend spells this `friend`
    #[serde(rename = "peer", alias = "friend")]
    Peer,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(alias = "ID")]
    pub id: MessageId,
    #[serde(alias = "From")]
    pub from: Sender,
    #[serde(alias = "Content")]
    pub content: String,
    #[serde(default, alias = "CreatedAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    #[allow(dead_code)] // Test and fixture constructor
    pub fn new(id: MessageId, from: Sender, content: impl Into<String>) -> Self {
        Self {
            id,
            from,
            content: content.into(),
            created_at: None,
        }
    }
}

/// Body of `POST /api/chat/messages/{contactId}`
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}
