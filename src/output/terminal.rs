//! Terminal renderer: conversation bubbles as styled flowing text.
//!
//! Only messages added since the previous snapshot are printed, so the
//! conversation reads like a chat log. Markdown is rendered "lite":
//! `**bold**`, `` `code` ``, fenced blocks, and the "Why it matters:" /
//! "Fix:" section markers.

use std::sync::{LazyLock, Mutex};

use colored::Colorize;
use regex::Regex;

use crate::constants::{STATUS_ALL_CLEAR, STATUS_FAILED, STATUS_TIMED_OUT};
use crate::models::{Message, MessageAction, Role};
use crate::store::{Snapshot, SnapshotSink};

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold regex is valid"));

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code regex is valid"));

#[derive(Debug, Default)]
struct RenderState {
    /// Messages printed so far.
    rendered: usize,
    /// Last printed message, used to find where new messages start once
    /// the store begins evicting.
    last: Option<Message>,
    thinking_label: String,
    result_status: String,
}

/// Prints newly added messages and status changes to stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    state: Mutex<RenderState>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages rendered so far.
    pub fn rendered_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).rendered
    }

    /// Render everything in `snapshot` that was not rendered before.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut output = String::new();

        if snapshot.thinking_label != state.thinking_label {
            if !snapshot.thinking_label.is_empty() {
                output.push_str(&format!("{}\n", snapshot.thinking_label.dimmed().italic()));
            }
            state.thinking_label = snapshot.thinking_label.clone();
        }

        let start = match &state.last {
            Some(last) => snapshot
                .messages
                .iter()
                .rposition(|m| m == last)
                .map_or(0, |i| i + 1),
            None => 0,
        };
        let mut previous = state.last.clone();
        for message in &snapshot.messages[start..] {
            let new_group = previous
                .as_ref()
                .is_none_or(|p| !p.in_run(&message.timestamp, &message.file_name));
            output.push_str(&render_message(message, new_group));
            previous = Some(message.clone());
            state.rendered += 1;
        }
        state.last = previous;

        if snapshot.result_status != state.result_status {
            if !snapshot.result_status.is_empty() {
                output.push_str(&render_status(&snapshot.result_status));
            }
            state.result_status = snapshot.result_status.clone();
        }

        output
    }
}

impl SnapshotSink for TerminalRenderer {
    fn push(&self, snapshot: &Snapshot) {
        let output = self.render(snapshot);
        if !output.is_empty() {
            print!("{output}");
        }
    }
}

fn render_message(message: &Message, new_group: bool) -> String {
    let mut output = String::new();
    if new_group {
        let name = std::path::Path::new(&message.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| message.file_name.clone());
        output.push_str(&format!("\n{} {}\n", "──".dimmed(), name.bold()));
    }

    let marker = match message.role {
        Role::Assistant => "›".cyan().bold(),
        Role::User => "you ›".magenta().bold(),
    };
    output.push_str(&format!(" {marker}\n"));
    output.push_str(&render_markdown(&message.content));

    if let Some(MessageAction::AnalyzeWholeFile { label, file_name }) = &message.action {
        output.push_str(&format!(
            "   {} {} {}\n",
            "→".cyan(),
            label.bold(),
            format!("(sidecoach analyze {file_name})").dimmed()
        ));
    }
    output.push('\n');
    output
}

/// Indent and style message text line by line.
fn render_markdown(text: &str) -> String {
    let mut output = String::new();
    let mut in_fence = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            output.push_str(&format!("   {}\n", line.dimmed()));
            continue;
        }
        if in_fence {
            output.push_str(&format!("   {}\n", line.dimmed()));
            continue;
        }
        output.push_str(&format!("   {}\n", render_inline(line)));
    }
    output
}

fn render_inline(line: &str) -> String {
    let (label, rest) = if let Some(rest) = line.strip_prefix("Why it matters:") {
        (Some("Why it matters:".yellow().bold().to_string()), rest)
    } else if let Some(rest) = line.strip_prefix("Fix:") {
        (Some("Fix:".green().bold().to_string()), rest)
    } else {
        (None, line)
    };

    let styled = BOLD_RE.replace_all(rest, |caps: &regex::Captures<'_>| {
        caps[1].bold().to_string()
    });
    let styled = CODE_RE.replace_all(&styled, |caps: &regex::Captures<'_>| {
        caps[1].cyan().to_string()
    });

    match label {
        Some(label) => format!("{label}{styled}"),
        None => styled.into_owned(),
    }
}

fn render_status(status: &str) -> String {
    let styled = match status {
        STATUS_ALL_CLEAR => format!("✔ {status}").green().bold(),
        STATUS_FAILED | STATUS_TIMED_OUT => format!("✖ {status}").red().bold(),
        _ => format!("• {status}").yellow().bold(),
    };
    format!("{styled}\n")
}
