//! Chat Console - terminal client for the admin chat backend
//!
//! Keeps a per-contact message cache in sync with `/api/chat/*` through
//! incremental fetches, and drives it from a line-oriented prompt.

mod config;
mod console;
mod session;
mod transport;

use config::ChatConfig;
use console::{parse_command, render_contacts, render_conversation, Command, HELP};
use session::{spawn_poller, ChatSession, ProductionSession};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{HttpTransport, LoggingTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout is reserved for the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_console=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ChatConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        page_limit = config.page_limit,
        "Starting chat console"
    );

    let http = HttpTransport::new(&config.base_url, config.http_timeout)?;
    let session: Arc<ProductionSession> = Arc::new(ChatSession::new(
        LoggingTransport::new(Arc::new(http)),
        config.page_limit,
    ));

    if let Err(e) = session.start().await {
        eprintln!("Failed to load chat: {e}");
    }
    let view = session.view();
    print!("{}", render_contacts(&view));
    print!("{}", render_conversation(&view));

    let (updates_tx, mut updates_rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let poller = spawn_poller(
        session.clone(),
        config.poll_interval,
        updates_tx,
        cancel.clone(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&session, &line).await {
                    break;
                }
            }
            Some(view) = updates_rx.recv() => {
                print!("{}", render_conversation(&view));
            }
        }
    }

    cancel.cancel();
    poller.await?;
    tracing::info!("Chat console stopped");
    Ok(())
}

/// Run one input line; returns false when the user asked to quit
async fn handle_line(session: &ProductionSession, line: &str) -> bool {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            eprintln!("{e}");
            return true;
        }
    };

    let result = match command {
        Command::Quit => return false,
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Show => {
            print!("{}", render_conversation(&session.view()));
            Ok(())
        }
        Command::Contacts => session.load_contacts().await.map(|_| {
            print!("{}", render_contacts(&session.view()));
        }),
        Command::Refresh => {
            if let Some((_, outcome)) = session.poll().await {
                if outcome.changed() {
                    print!("{}", render_conversation(&session.view()));
                }
            }
            Ok(())
        }
        Command::Switch(contact_id) => session.switch_active(&contact_id).await.map(|_| {
            print!("{}", render_conversation(&session.view()));
        }),
        Command::Send(text) => session.send_message(&text).await.map(|_| {
            print!("{}", render_conversation(&session.view()));
        }),
    };

    if let Err(e) = result {
        eprintln!("error ({}): {e}", e.kind.as_str());
    }
    true
}
