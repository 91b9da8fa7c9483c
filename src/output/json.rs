//! JSON-lines sink for the stdio bridge.
//!
//! Writes each snapshot as one `{"type":"messages",...}` line.

use std::io::Write;
use std::sync::Mutex;

use tracing::warn;

use crate::store::{Snapshot, SnapshotSink};

/// Serializes snapshots as newline-delimited JSON.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    /// A sink writing to the process stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> SnapshotSink for JsonLinesSink<W> {
    fn push(&self, snapshot: &Snapshot) {
        let line = match serde_json::to_string(snapshot) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to serialize snapshot: {e}");
                return;
            }
        };
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!("failed to write snapshot: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    #[test]
    fn writes_one_line_per_snapshot() {
        let sink = JsonLinesSink::new(Vec::new());
        let mut snapshot = Snapshot {
            has_api_key: true,
            ..Default::default()
        };
        sink.push(&snapshot);
        snapshot
            .messages
            .push(Message::assistant("2026-01-01T00:00:00.000Z", "a.js", "Fix: x"));
        snapshot.result_status = "1 issue found".to_string();
        sink.push(&snapshot);

        let written = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "messages");
        assert_eq!(first["hasApiKey"], true);

        let second: Snapshot = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.messages[0].file_name, "a.js");
        assert_eq!(second.result_status, "1 issue found");
    }
}
