//! Property-based tests for the session cache
//!
//! These tests verify the cursor and history invariants hold across
//! arbitrary fetch sequences, including stale and out-of-order results.

use super::cache::*;
use crate::transport::{Contact, ContactStatus, Message, MessageId, Sender};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn cache_with_contact() -> SessionCache {
    let mut cache = SessionCache::new();
    cache.replace_contacts(vec![
        Contact::new("a", "Alice", ContactStatus::Online),
        Contact::new("b", "Bob", ContactStatus::Away),
    ]);
    cache
}

fn message(id: MessageId) -> Message {
    Message::new(id, Sender::Peer, format!("m{id}"))
}

fn ids(cache: &SessionCache, contact_id: &str) -> Vec<MessageId> {
    cache.messages(contact_id).iter().map(|m| m.id).collect()
}

fn strictly_ascending(ids: &[MessageId]) -> bool {
    ids.windows(2).all(|w| w[0] < w[1])
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Page sizes for a well-behaved backend: each page continues after the cursor
fn arb_page_sizes() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..6, 1..12)
}

/// Arbitrary (possibly stale or unsorted) id batches
fn arb_batches() -> impl Strategy<Value = Vec<Vec<MessageId>>> {
    proptest::collection::vec(proptest::collection::vec(1u64..60, 0..6), 1..12)
}

#[derive(Debug, Clone)]
enum Step {
    Issue(FetchMode),
    /// Complete the in-flight fetch at this index (mod len) with these ids
    Complete(usize, Vec<MessageId>),
    Fail(usize),
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        3 => prop_oneof![Just(FetchMode::Initial), Just(FetchMode::Incremental)]
            .prop_map(Step::Issue),
        4 => (any::<usize>(), proptest::collection::vec(1u64..40, 0..5))
            .prop_map(|(i, mut ids)| {
                ids.sort_unstable();
                ids.dedup();
                Step::Complete(i, ids)
            }),
        1 => any::<usize>().prop_map(Step::Fail),
    ];
    proptest::collection::vec(step, 1..30)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Sequential incremental fetches: cursor tracks the last element of the
    /// latest non-empty page and never decreases.
    #[test]
    fn prop_cursor_follows_last_nonempty_page(sizes in arb_page_sizes()) {
        let mut cache = cache_with_contact();
        let mut next_id: MessageId = 1;
        let mut last_nonempty: Option<MessageId> = None;
        let mut previous_cursor: MessageId = 0;

        for size in sizes {
            let ticket = cache.begin_fetch("a", FetchMode::Incremental);
            prop_assert_eq!(ticket.after_id, previous_cursor);

            let page: Vec<Message> = (next_id..next_id + size as MessageId).map(message).collect();
            next_id += size as MessageId;
            if let Some(last) = page.last() {
                last_nonempty = Some(last.id);
            }
            cache.apply_fetch(&ticket, page);

            prop_assert_eq!(cache.last_seen_id("a"), last_nonempty);
            let cursor = cache.last_seen_id("a").unwrap_or(0);
            prop_assert!(cursor >= previous_cursor);
            previous_cursor = cursor;
        }
    }

    /// Whatever an incremental fetch after X returns, nothing at or below X
    /// is added, cached messages are kept, and history stays strictly
    /// ascending.
    #[test]
    fn prop_incremental_appends_only_newer(seed in proptest::collection::vec(1u64..30, 0..5), batches in arb_batches()) {
        let mut cache = cache_with_contact();
        let mut seed = seed;
        seed.sort_unstable();
        seed.dedup();
        let t = cache.begin_fetch("a", FetchMode::Initial);
        cache.apply_fetch(&t, seed.into_iter().map(message).collect());

        for batch in batches {
            let before = ids(&cache, "a");
            let cursor_before = cache.last_seen_id("a");
            let ticket = cache.begin_fetch("a", FetchMode::Incremental);
            let last_id = batch.last().copied();
            cache.apply_fetch(&ticket, batch.into_iter().map(message).collect());

            let after = ids(&cache, "a");
            prop_assert!(before.iter().all(|id| after.contains(id)));
            prop_assert!(after
                .iter()
                .filter(|id| !before.contains(id))
                .all(|id| *id > ticket.after_id));
            prop_assert!(strictly_ascending(&after));

            let expected_cursor = match last_id {
                Some(last) if last > ticket.after_id => Some(last),
                _ => cursor_before,
            };
            prop_assert_eq!(cache.last_seen_id("a"), expected_cursor);
        }
    }

    /// Interleaved issue/complete/fail in any order keeps the cursor
    /// consistent with the history and the history ordered.
    #[test]
    fn prop_interleaved_fetches_keep_invariants(steps in arb_steps()) {
        let mut cache = cache_with_contact();
        let mut in_flight: Vec<FetchTicket> = Vec::new();
        let mut previous_cursor: MessageId = 0;

        for step in steps {
            match step {
                Step::Issue(mode) => in_flight.push(cache.begin_fetch("a", mode)),
                Step::Complete(i, batch) => {
                    if in_flight.is_empty() {
                        continue;
                    }
                    let ticket = in_flight.remove(i % in_flight.len());
                    let outcome = cache.apply_fetch(&ticket, batch.into_iter().map(message).collect());
                    if ticket.mode == FetchMode::Incremental {
                        let cursor = cache.last_seen_id("a").unwrap_or(0);
                        prop_assert!(cursor >= previous_cursor, "incremental regressed cursor: {:?}", outcome);
                    }
                }
                Step::Fail(i) => {
                    if in_flight.is_empty() {
                        continue;
                    }
                    let ticket = in_flight.remove(i % in_flight.len());
                    let before = cache.clone();
                    cache.abort_fetch(&ticket);
                    prop_assert_eq!(cache.messages("a"), before.messages("a"));
                    prop_assert_eq!(cache.last_seen_id("a"), before.last_seen_id("a"));
                }
            }

            let history = ids(&cache, "a");
            prop_assert!(strictly_ascending(&history));
            if let Some(last) = history.last() {
                prop_assert_eq!(cache.last_seen_id("a"), Some(*last));
            }
            previous_cursor = cache.last_seen_id("a").unwrap_or(0);
        }

        if in_flight.is_empty() && cache.last_seen_id("a").is_some() {
            prop_assert_ne!(cache.load_state("a"), ContactLoadState::Unloaded);
        }
    }

    /// Whitespace-only text never produces a send ticket.
    #[test]
    fn prop_whitespace_send_rejected(text in "[ \t\r\n]{0,12}", active in any::<bool>()) {
        let mut cache = cache_with_contact();
        if active {
            cache.set_active("b").unwrap();
        }
        let before = cache.clone();
        prop_assert!(cache.begin_send(&text).is_err());
        prop_assert_eq!(cache, before);
    }

    /// A successful send always ends the active history with the backend's
    /// message and moves the cursor to its id.
    #[test]
    fn prop_send_appends_backend_message(existing in 0u64..20, gap in 1u64..5, text in "[a-z]{1,10}") {
        let mut cache = cache_with_contact();
        cache.set_active("b").unwrap();
        let t = cache.begin_fetch("b", FetchMode::Initial);
        cache.apply_fetch(&t, (1..=existing).map(message).collect());

        let ticket = cache.begin_send(&text).unwrap();
        let sent = Message::new(existing + gap, Sender::Me, text.clone());
        cache.apply_sent(&ticket, sent.clone());

        prop_assert_eq!(cache.messages("b").len() as u64, existing + 1);
        prop_assert_eq!(cache.messages("b").last(), Some(&sent));
        prop_assert_eq!(cache.last_seen_id("b"), Some(existing + gap));
    }
}
