//! Integration tests for the two snapshot sinks: the JSON-lines bridge
//! output and the terminal chat log, both fed by a real ConversationStore.

use std::io::Write;
use std::sync::{Arc, Mutex};

use sidecoach::constants::{MAX_MESSAGES, STATUS_ALL_CLEAR, STATUS_ISSUE_FOUND, SYSTEM_SENDER};
use sidecoach::feedback::messages;
use sidecoach::models::{Message, Subtlety};
use sidecoach::output::{JsonLinesSink, TerminalRenderer};
use sidecoach::store::{ConversationStore, Snapshot, SnapshotSink};

/// A writer whose buffer stays readable after the sink moves into a store.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).expect("every line is JSON"))
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Forwards pushes to a shared renderer and keeps the rendered text.
#[derive(Clone, Default)]
struct RenderedLog {
    renderer: Arc<TerminalRenderer>,
    output: Arc<Mutex<String>>,
}

impl RenderedLog {
    fn text(&self) -> String {
        self.output.lock().unwrap().clone()
    }
}

impl SnapshotSink for RenderedLog {
    fn push(&self, snapshot: &Snapshot) {
        let out = self.renderer.render(snapshot);
        self.output.lock().unwrap().push_str(&out);
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

#[test]
fn every_mutation_writes_a_full_snapshot_line() {
    let buf = SharedBuf::default();
    let store = ConversationStore::new(JsonLinesSink::new(buf.clone()));

    store.set_api_key_status(true);
    store.set_thinking_label("Reviewing app.js...");
    store.add_messages([Message::assistant("t1", "src/app.js", "Fix: rename it")]);
    store.set_thinking_label("");
    store.set_result_status(STATUS_ISSUE_FOUND);

    let lines = buf.lines();
    assert_eq!(lines.len(), 5);
    for line in &lines {
        assert_eq!(line["type"], "messages");
        assert!(line["messages"].is_array());
        assert!(line.get("hasApiKey").is_some());
        assert!(line.get("thinkingLabel").is_some());
        assert!(line.get("resultStatus").is_some());
    }

    assert_eq!(lines[1]["thinkingLabel"], "Reviewing app.js...");
    let last = &lines[4];
    assert_eq!(last["hasApiKey"], true);
    assert_eq!(last["thinkingLabel"], "");
    assert_eq!(last["resultStatus"], STATUS_ISSUE_FOUND);

    let msgs = last["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 2, "welcome plus the run message");
    assert_eq!(msgs[0]["fileName"], SYSTEM_SENDER);
    assert_eq!(msgs[1]["fileName"], "src/app.js");
    assert_eq!(msgs[1]["role"], "assistant");
    assert!(msgs[1].get("action").is_none(), "absent actions are omitted");
}

#[test]
fn whole_file_action_serializes_with_its_file_name() {
    let buf = SharedBuf::default();
    let store = ConversationStore::blank(JsonLinesSink::new(buf.clone()));
    store.add_messages([messages::no_diff_prompt("src/app.js", Subtlety::Direct)]);

    let lines = buf.lines();
    let action = &lines[0]["messages"][0]["action"];
    assert_eq!(action["type"], "analyzeWholeFile");
    assert_eq!(action["label"], messages::WHOLE_FILE_ACTION_LABEL);
    assert_eq!(action["fileName"], "src/app.js");
}

#[test]
fn snapshot_lines_stay_bounded() {
    let buf = SharedBuf::default();
    let store = ConversationStore::new(JsonLinesSink::new(buf.clone()));
    let batch: Vec<_> = (0..MAX_MESSAGES + 7)
        .map(|i| Message::assistant(format!("t{i}"), "a.js", format!("bubble {i}")))
        .collect();
    store.add_messages(batch);

    let lines = buf.lines();
    let msgs = lines.last().unwrap()["messages"].as_array().unwrap().clone();
    assert_eq!(msgs.len(), MAX_MESSAGES);
    assert_eq!(msgs.last().unwrap()["content"], format!("bubble {}", MAX_MESSAGES + 6));
    assert!(
        msgs.iter().all(|m| m["fileName"] != SYSTEM_SENDER),
        "the welcome message is evicted first"
    );
}

#[test]
fn json_line_parses_back_into_a_snapshot() {
    let buf = SharedBuf::default();
    let store = ConversationStore::new(JsonLinesSink::new(buf.clone()));
    store.set_result_status(STATUS_ALL_CLEAR);

    let raw = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    let parsed: Snapshot = serde_json::from_str(raw.lines().last().unwrap()).unwrap();
    assert_eq!(parsed, store.snapshot());
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

#[test]
fn terminal_log_prints_each_message_once() {
    colored::control::set_override(false);
    let log = RenderedLog::default();
    let store = ConversationStore::blank(log.clone());

    store.set_thinking_label("Reviewing app.js...");
    store.add_messages([
        Message::assistant("t1", "src/app.js", "Is `count` ever reset?"),
        Message::assistant("t1", "src/app.js", "Why it matters: stale totals.\n\nFix: reset it."),
    ]);
    store.set_thinking_label("");
    store.set_result_status(STATUS_ISSUE_FOUND);
    store.add_messages([Message::user("t1", "src/app.js", "where exactly?")]);

    let text = log.text();
    assert_eq!(text.matches("── app.js").count(), 1, "one header per run");
    assert_eq!(text.matches("Is count ever reset?").count(), 1);
    assert!(text.contains("Why it matters: stale totals."));
    assert!(text.contains("Fix: reset it."));
    assert!(text.contains("you ›"));
    assert!(text.contains(&format!("• {STATUS_ISSUE_FOUND}")));
    assert_eq!(text.matches("Reviewing app.js...").count(), 1);
    assert_eq!(log.renderer.rendered_count(), 3);
}

#[test]
fn terminal_log_shows_whole_file_hint() {
    colored::control::set_override(false);
    let log = RenderedLog::default();
    let store = ConversationStore::blank(log.clone());
    store.add_messages([messages::no_diff_prompt("src/app.js", Subtlety::Gentle)]);

    let text = log.text();
    assert!(text.contains(messages::WHOLE_FILE_ACTION_LABEL));
    assert!(text.contains("(sidecoach analyze src/app.js)"));
}

#[test]
fn terminal_log_keeps_up_after_eviction() {
    colored::control::set_override(false);
    let log = RenderedLog::default();
    let store = ConversationStore::blank(log.clone());

    let first: Vec<_> = (0..MAX_MESSAGES)
        .map(|i| Message::assistant("t1", "a.js", format!("old {i}")))
        .collect();
    store.add_messages(first);
    store.add_messages([Message::assistant("t2", "b.js", "fresh bubble")]);

    let text = log.text();
    assert_eq!(text.matches("fresh bubble").count(), 1);
    assert_eq!(text.matches("old 0").count(), 1, "evicted messages are not reprinted");
    assert_eq!(log.renderer.rendered_count(), MAX_MESSAGES + 1);
}
