//! Client-side chat session
//!
//! A pure cache of contacts, per-contact histories and fetch cursors, plus
//! the async operations that keep it in sync with the backend.

mod cache;
mod client;
mod poller;
mod view;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

#[allow(unused_imports)] // Inspection types used by tests
pub use cache::{ContactLoadState, FetchMode, SessionCache};
pub use cache::FetchOutcome;
pub use client::ChatSession;
pub use poller::spawn_poller;
pub use view::{ChatView, ContactSummary};

use crate::transport::LoggingTransport;

/// Session type wired up by the binary
pub type ProductionSession = ChatSession<LoggingTransport>;
