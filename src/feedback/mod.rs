//! Turning structured results into conversational text.
//!
//! [`format_coaching`] fixes the order of the parts (hint, then why it
//! matters, then fix). [`split_into_bubbles`] and
//! [`normalize_for_hint_mode`] prepare that text for display: one bubble
//! per point, each with a discoverable `Fix:` section.

pub mod messages;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CoachingResult, FollowUpResult};

/// Lead-in used when the model sends no opener.
pub const DEFAULT_OPENER: &str = "Let's see...";

/// Fix section body used when a bubble cannot be split.
pub const FIX_PLACEHOLDER: &str =
    "Ask Sidecoach to regenerate this point with a concrete patch.";

const WHY_PREFIX: &str = "Why it matters:";
const FIX_PREFIX: &str = "Fix:";

static LEADING_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").expect("bullet regex is valid"));

static FIX_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\n)(?:\*\*Fix:\*\*|Fix:)").expect("fix marker regex is valid")
});

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph regex is valid"));

/// Trim and drop one leading `-` or `*` list marker.
pub fn strip_leading_bullet(value: &str) -> String {
    LEADING_BULLET_RE.replace(value.trim(), "").into_owned()
}

/// Render a top-level result as blank-line separated parts.
///
/// Order: opener (or [`DEFAULT_OPENER`]), title and hint, "Why it
/// matters:", "Fix:". Empty parts are left out.
pub fn format_coaching(result: &CoachingResult) -> String {
    let mut parts = Vec::new();

    let opener = if result.opener.trim().is_empty() {
        DEFAULT_OPENER.to_string()
    } else {
        strip_leading_bullet(&result.opener)
    };
    push_non_empty(&mut parts, opener);

    let title = strip_leading_bullet(&result.title);
    let hint = strip_leading_bullet(&result.hint);
    match (title.is_empty(), hint.is_empty()) {
        (false, false) => parts.push(format!("{}. {hint}", title.trim_end_matches('.'))),
        (true, false) => parts.push(hint),
        (false, true) => parts.push(title),
        (true, true) => {}
    }

    push_tail(&mut parts, &result.why_it_matters, &result.fix);
    parts.join("\n\n").trim().to_string()
}

/// Render a follow-up answer. Same order as [`format_coaching`], no
/// default opener and no title.
pub fn format_follow_up(result: &FollowUpResult) -> String {
    let mut parts = Vec::new();
    push_non_empty(&mut parts, strip_leading_bullet(&result.opener));
    push_non_empty(&mut parts, strip_leading_bullet(&result.hint));
    push_tail(&mut parts, &result.why_it_matters, &result.fix);
    parts.join("\n\n").trim().to_string()
}

fn push_non_empty(parts: &mut Vec<String>, value: String) {
    if !value.is_empty() {
        parts.push(value);
    }
}

fn push_tail(parts: &mut Vec<String>, why_it_matters: &str, fix: &str) {
    let why_it_matters = why_it_matters.trim();
    if !why_it_matters.is_empty() {
        parts.push(format!("{WHY_PREFIX} {why_it_matters}"));
    }
    let fix = fix.trim();
    if !fix.is_empty() {
        parts.push(format!("{FIX_PREFIX} {fix}"));
    }
}

/// Split feedback into the bubbles shown one after another.
///
/// Two or more lines starting with `- **` mean a multi-point list: one
/// bubble per point (any text before the first point is its own bubble).
/// Otherwise the text is split into paragraphs, never inside a code
/// fence. Paragraphs that lead up to a `Fix:` paragraph stay together, so
/// a single formatted issue remains one bubble.
pub fn split_into_bubbles(feedback: &str) -> Vec<String> {
    let normalized = feedback.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Vec::new();
    }

    let bullet_count = normalized
        .lines()
        .filter(|line| line.starts_with("- **"))
        .count();
    if bullet_count >= 2 {
        return split_bullets(normalized);
    }

    let paragraphs = split_paragraphs(normalized);
    if paragraphs.len() <= 1 {
        return vec![normalized.to_string()];
    }

    if !paragraphs.iter().any(|p| starts_with_fix(p)) {
        return paragraphs;
    }

    let mut bubbles = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for paragraph in paragraphs {
        let closes = starts_with_fix(&paragraph);
        current.push(paragraph);
        if closes {
            bubbles.push(current.join("\n\n"));
            current.clear();
        }
    }
    if !current.is_empty() {
        bubbles.push(current.join("\n\n"));
    }
    bubbles
}

fn split_bullets(text: &str) -> Vec<String> {
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in text.lines() {
        if line.starts_with("- **") && blocks.last().is_some_and(|b| !b.is_empty()) {
            blocks.push(Vec::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }
    blocks
        .into_iter()
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|block| !block.is_empty())
        .collect()
}

/// Blank-line separated paragraphs, keeping fenced code blocks intact.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        if line.matches("```").count() % 2 == 1 {
            in_fence = !in_fence;
        }
        if !in_fence && line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n").trim().to_string());
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n").trim().to_string());
    }
    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

fn starts_with_fix(paragraph: &str) -> bool {
    let lower = paragraph.trim_start().to_ascii_lowercase();
    lower.starts_with("fix:") || lower.starts_with("**fix:**")
}

/// Make sure a bubble carries a `Fix:` section.
///
/// A bubble that already has one is returned trimmed but otherwise
/// unchanged. Otherwise everything after the first paragraph, or after the
/// first two sentences, becomes the fix; if neither split is possible a
/// placeholder fix is appended.
pub fn normalize_for_hint_mode(bubble: &str) -> String {
    let normalized = bubble.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() || FIX_MARKER_RE.is_match(normalized) {
        return normalized.to_string();
    }

    let paragraphs: Vec<&str> = PARAGRAPH_BREAK_RE
        .split(normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.len() > 1 {
        return format!(
            "{}\n\n{FIX_PREFIX}\n{}",
            paragraphs[0],
            paragraphs[1..].join("\n\n")
        );
    }

    let sentences = split_sentences(normalized);
    if sentences.len() > 2 {
        return format!(
            "{}\n\n{FIX_PREFIX}\n{}",
            sentences[..2].join(" "),
            sentences[2..].join(" ")
        );
    }

    format!("{normalized}\n\n{FIX_PREFIX}\n{FIX_PLACEHOLDER}")
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let end = idx + ch.len_utf8();
        if !chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            continue;
        }
        sentences.push(&text[start..end]);
        while chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            chars.next();
        }
        start = chars.peek().map_or(text.len(), |(i, _)| *i);
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences.retain(|s| !s.is_empty());
    sentences
}
