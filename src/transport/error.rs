//! Chat transport error types

use thiserror::Error;

/// Chat error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    /// HTTP status when the backend answered with a non-2xx response
    pub status: Option<u16>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Transport, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Application, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Validation, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Decode, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Network failure or non-2xx response
    Transport,
    /// 2xx response whose envelope carries a nonzero `code`
    Application,
    /// Rejected locally before any request was made
    Validation,
    /// Payload could not be mapped to the expected type
    Decode,
}

impl ChatErrorKind {
    /// Whether the next poll or user action may plausibly succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transport)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Application => "application",
            Self::Validation => "validation",
            Self::Decode => "decode",
        }
    }
}
