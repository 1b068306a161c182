//! Background refresh of the active conversation

use super::client::ChatSession;
use super::view::ChatView;
use crate::transport::ChatTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Spawn a task that polls the active contact every `interval`.
///
/// A fresh view is pushed to `updates` only when new messages landed for a
/// contact that is still active once the poll completes. The task exits when
/// `cancel` fires or the receiver is dropped.
pub fn spawn_poller<T>(
    session: Arc<ChatSession<T>>,
    interval: Duration,
    updates: mpsc::Sender<ChatView>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    T: ChatTransport + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the caller has just loaded
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some((contact_id, outcome)) = session.poll().await else {
                continue;
            };
            if !outcome.changed() {
                continue;
            }
            if session.active_contact_id().as_deref() != Some(contact_id.as_str()) {
                tracing::debug!(contact_id = %contact_id, "Polled contact no longer active; not rendering");
                continue;
            }
            if updates.send(session.view()).await.is_err() {
                break;
            }
        }

        tracing::debug!("Chat poller stopped");
    })
}
