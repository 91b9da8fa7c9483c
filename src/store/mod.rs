//! Conversation state shown to the user.
//!
//! The store is the single source of truth for what the presentation layer
//! displays. Every mutation pushes a full [`Snapshot`] to the attached
//! [`SnapshotSink`]; sinks keep no state of their own beyond what they need
//! to animate newly added messages.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_MESSAGES, SYSTEM_SENDER};
use crate::feedback::messages;
use crate::models::Message;

/// Full state pushed to the presentation layer after every mutation.
///
/// Serialized as `{"type":"messages","messages":[...],"hasApiKey":..,
/// "thinkingLabel":"..","resultStatus":".."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "messages", rename_all = "camelCase")]
pub struct Snapshot {
    pub messages: Vec<Message>,
    pub has_api_key: bool,
    /// Busy indicator text; empty when idle.
    pub thinking_label: String,
    /// Terse outcome of the last run; empty hides the status.
    pub result_status: String,
}

/// Receiver of state snapshots.
pub trait SnapshotSink: Send + Sync {
    fn push(&self, snapshot: &Snapshot);
}

/// The messages of the most recent analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub timestamp: String,
    pub file_name: String,
    /// Every message sharing the run key, in original order.
    pub messages: Vec<Message>,
}

/// Bounded, ordered message list plus status flags.
pub struct ConversationStore {
    state: Mutex<Snapshot>,
    sink: Box<dyn SnapshotSink>,
}

impl ConversationStore {
    /// A store seeded with the welcome message.
    pub fn new(sink: impl SnapshotSink + 'static) -> Self {
        let store = Self::blank(sink);
        store.lock().messages.push(messages::welcome());
        store
    }

    /// A store with no messages at all.
    pub fn blank(sink: impl SnapshotSink + 'static) -> Self {
        Self {
            state: Mutex::new(Snapshot::default()),
            sink: Box::new(sink),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` and push the resulting state.
    fn mutate(&self, change: impl FnOnce(&mut Snapshot)) {
        let mut state = self.lock();
        change(&mut state);
        self.sink.push(&state);
    }

    /// Push the current state without changing it.
    pub fn publish(&self) {
        self.mutate(|_| {});
    }

    /// Append messages, evicting the oldest beyond the retention limit.
    pub fn add_messages(&self, new: impl IntoIterator<Item = Message>) {
        self.mutate(|state| {
            state.messages.extend(new);
            let excess = state.messages.len().saturating_sub(MAX_MESSAGES);
            state.messages.drain(..excess);
        });
    }

    pub fn set_api_key_status(&self, has_api_key: bool) {
        self.mutate(|state| state.has_api_key = has_api_key);
    }

    pub fn set_thinking_label(&self, label: impl Into<String>) {
        let label = label.into();
        self.mutate(|state| state.thinking_label = label);
    }

    pub fn set_result_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.mutate(|state| state.result_status = status);
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// The most recent analysis run: the latest message not sent by the
    /// system sender, and every message sharing its `(timestamp, file_name)`.
    pub fn latest_run_context(&self) -> Option<RunContext> {
        let state = self.lock();
        let anchor = state
            .messages
            .iter()
            .rev()
            .find(|m| m.file_name != SYSTEM_SENDER)?;
        let (timestamp, file_name) = (anchor.timestamp.clone(), anchor.file_name.clone());
        let messages = state
            .messages
            .iter()
            .filter(|m| m.in_run(&timestamp, &file_name))
            .cloned()
            .collect();
        Some(RunContext {
            timestamp,
            file_name,
            messages,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    /// Sink that keeps every pushed snapshot.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub pushed: Arc<Mutex<Vec<Snapshot>>>,
    }

    impl RecordingSink {
        pub(crate) fn count(&self) -> usize {
            self.pushed.lock().unwrap().len()
        }

        pub(crate) fn last(&self) -> Option<Snapshot> {
            self.pushed.lock().unwrap().last().cloned()
        }
    }

    impl SnapshotSink for RecordingSink {
        fn push(&self, snapshot: &Snapshot) {
            self.pushed.lock().unwrap().push(snapshot.clone());
        }
    }

    fn msg(ts: &str, file: &str, content: &str) -> Message {
        Message::assistant(ts, file, content)
    }

    #[test]
    fn new_store_starts_with_welcome() {
        let sink = RecordingSink::default();
        let store = ConversationStore::new(sink.clone());
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].file_name, SYSTEM_SENDER);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn every_mutation_pushes_full_state() {
        let sink = RecordingSink::default();
        let store = ConversationStore::blank(sink.clone());
        store.set_api_key_status(true);
        store.set_thinking_label("Thinking... a.js");
        store.add_messages([msg("t1", "a.js", "hi")]);
        store.set_result_status("1 issue found");
        store.set_thinking_label("");

        assert_eq!(sink.count(), 5);
        let last = sink.last().unwrap();
        assert!(last.has_api_key);
        assert_eq!(last.thinking_label, "");
        assert_eq!(last.result_status, "1 issue found");
        assert_eq!(last.messages.len(), 1);
    }

    #[test]
    fn truncates_to_most_recent_fifty() {
        let store = ConversationStore::blank(RecordingSink::default());
        store.add_messages((0..30).map(|i| msg("t", "a.js", &i.to_string())));
        store.add_messages((30..75).map(|i| msg("t", "a.js", &i.to_string())));

        let contents: Vec<String> = store.messages().into_iter().map(|m| m.content).collect();
        let expected: Vec<String> = (25..75).map(|i| i.to_string()).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn no_run_context_with_only_system_messages() {
        let store = ConversationStore::new(RecordingSink::default());
        assert!(store.latest_run_context().is_none());
    }

    #[test]
    fn latest_run_context_collects_the_run_group() {
        let store = ConversationStore::new(RecordingSink::default());
        store.add_messages([
            msg("t1", "a.js", "old run"),
            msg("t2", "b.js", "bubble 1"),
            msg("t2", "b.js", "bubble 2"),
            msg("t2", "c.js", "other file, same time"),
            msg("t2", "b.js", "bubble 3"),
        ]);
        store.add_messages([msg("t9", SYSTEM_SENDER, "system note")]);

        let run = store.latest_run_context().unwrap();
        assert_eq!(run.timestamp, "t2");
        assert_eq!(run.file_name, "b.js");
        let contents: Vec<&str> = run.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["bubble 1", "bubble 2", "bubble 3"]);
    }

    #[test]
    fn snapshot_serializes_with_type_tag() {
        let store = ConversationStore::blank(RecordingSink::default());
        store.set_api_key_status(true);
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["type"], "messages");
        assert_eq!(json["hasApiKey"], true);
        assert_eq!(json["thinkingLabel"], "");
        assert_eq!(json["resultStatus"], "");
        assert!(json["messages"].as_array().unwrap().is_empty());
    }
}
