//! Presentation sinks for conversation snapshots: terminal and JSON lines.

pub mod json;
pub mod terminal;

pub use json::JsonLinesSink;
pub use terminal::TerminalRenderer;
