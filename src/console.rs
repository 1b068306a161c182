//! Line-oriented terminal front end
//!
//! Parses stdin lines into commands and renders `ChatView` snapshots as
//! plain text. Message content is sanitized here so control sequences from
//! the backend cannot drive the terminal.

use crate::session::{ChatView, ContactSummary};
use crate::transport::{ContactStatus, Sender};
use std::fmt::Write;

pub const HELP: &str = "\
Commands:
  /switch <id>   open a conversation (reloads its history)
  /contacts      reload the contact list
  /refresh       fetch new messages for the open conversation
  /show          redraw the current conversation
  /help          show this help
  /quit          exit
Any other text is sent to the open conversation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Switch(String),
    Contacts,
    Refresh,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingContact,
    Unknown(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContact => write!(f, "usage: /switch <contact id>"),
            Self::Unknown(cmd) => write!(f, "unknown command {cmd} (try /help)"),
        }
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Send(trimmed.to_string())));
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, a)| (n, a.trim()));

    let command = match name {
        "switch" | "s" => {
            if arg.is_empty() {
                return Err(ParseError::MissingContact);
            }
            Command::Switch(arg.to_string())
        }
        "contacts" => Command::Contacts,
        "refresh" | "r" => Command::Refresh,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(format!("/{other}"))),
    };
    Ok(Some(command))
}

fn status_dot(status: ContactStatus) -> char {
    match status {
        ContactStatus::Online => '●',
        ContactStatus::Away => '◐',
        ContactStatus::Offline => '○',
    }
}

/// Replace control characters (other than tab) with their escaped form
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\t' {
                c.escape_default().to_string()
            } else {
                c.to_string()
            }
        })
        .collect()
}

fn render_contact(out: &mut String, contact: &ContactSummary) {
    let marker = if contact.active { '>' } else { ' ' };
    let _ = write!(
        out,
        "{marker} [{}] {} {} ({})",
        contact.avatar,
        sanitize(&contact.name),
        status_dot(contact.status),
        contact.id
    );
    if let Some(preview) = &contact.preview {
        let _ = write!(out, "  {}", sanitize(preview));
    }
    out.push('\n');
}

/// Contact list with the recent/all split
pub fn render_contacts(view: &ChatView) -> String {
    let mut out = String::new();
    if view.recent.is_empty() {
        out.push_str("No contacts.\n");
        return out;
    }
    out.push_str("Recent\n");
    for contact in &view.recent {
        render_contact(&mut out, contact);
    }
    if !view.all.is_empty() {
        out.push_str("All\n");
        for contact in &view.all {
            render_contact(&mut out, contact);
        }
    }
    out
}

/// Header plus the open conversation
pub fn render_conversation(view: &ChatView) -> String {
    let mut out = String::new();
    if let Some(header) = &view.header {
        let _ = writeln!(
            out,
            "── [{}] {} · {} ──",
            header.avatar,
            sanitize(&header.name),
            header.status_text()
        );
    }
    if view.messages.is_empty() {
        out.push_str("No messages yet. Say hello!\n");
        return out;
    }
    for message in &view.messages {
        let who = match message.from {
            Sender::Me => "me",
            Sender::Peer => "them",
        };
        let _ = writeln!(out, "{who:>4} │ {}", sanitize(&message.content));
    }
    out
}
