//! Prompt construction for analysis and follow-up requests.
//!
//! Everything here is a pure function of its inputs: no I/O, no settings
//! lookups. Noise level only affects the sampling temperature; subtlety
//! selects the tone instructions.

use crate::models::{NoiseLevel, Subtlety};

const PERSONA: &str = "You are Sidecoach, a pragmatic senior engineer pairing with the user. \
Be conversational and a little playful, but technically precise. \
Lead with hints and questions. Do not output HTML. \
Never put concrete code changes, replacement lines, or step-by-step fixes anywhere before the `fix` field: \
exploratory guidance always comes first and the concrete fix always comes last.";

/// The two instructions sent to the model, plus the sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// Inputs to [`build`].
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub file_content: &'a str,
    pub language_id: &'a str,
    pub change_set: &'a str,
    pub noise_level: NoiseLevel,
    pub subtlety: Subtlety,
}

/// Build the system and user instructions for a top-level analysis.
pub fn build(input: PromptInput<'_>) -> Prompt {
    Prompt {
        system: system_instruction(input.subtlety),
        user: user_instruction(&input),
        temperature: input.noise_level.temperature(),
    }
}

/// Persona, ordering constraint, and tone mode.
pub fn system_instruction(subtlety: Subtlety) -> String {
    let tone = match subtlety {
        Subtlety::Gentle => {
            "Tone mode: gentle. Be supportive, calm, and encouraging. Avoid harsh phrasing."
        }
        Subtlety::Direct => "Tone mode: direct. Be concise and practical without being rude.",
        Subtlety::Strict => {
            "Tone mode: strict. Be firm, call out risky patterns clearly, and prioritize high-impact issues."
        }
    };
    format!("{PERSONA} {tone}")
}

fn tone_instruction(subtlety: Subtlety) -> &'static str {
    match subtlety {
        Subtlety::Gentle => "Use supportive language and avoid harsh wording.",
        Subtlety::Direct => "Be direct and practical, without being rude.",
        Subtlety::Strict => {
            "Be strict: call out risky patterns clearly and prioritize high-impact issues."
        }
    }
}

fn user_instruction(input: &PromptInput<'_>) -> String {
    let language = if input.language_id.trim().is_empty() {
        "source"
    } else {
        input.language_id
    };
    let scope = if input.change_set.trim().is_empty() {
        "CHANGED DIFF is empty: review the FULL FILE CONTEXT instead."
    } else {
        "Review only the code shown in the CHANGED DIFF section. Do not coach about unchanged lines; \
         use FULL FILE CONTEXT only to understand the change."
    };

    [
        format!("Review this {language} file that was just saved."),
        scope.to_string(),
        "Return exactly one coaching suggestion: the single highest-impact issue only.".to_string(),
        "If there are no meaningful issues, set verdict to \"all_clear\" and leave the other fields empty."
            .to_string(),
        tone_instruction(input.subtlety).to_string(),
        "Fill the schema fields as follows (use an empty string for any field that does not apply):"
            .to_string(),
        "- opener: a short conversational opener".to_string(),
        "- title: leave empty unless truly necessary; prefer natural chat over headings".to_string(),
        "- hint: one or two natural-language hint lines in question style, with no concrete patch"
            .to_string(),
        "- whyItMatters: a short impact statement".to_string(),
        "- fix: the concrete fix; may include a fenced code block".to_string(),
        "Critical rule: the hint must not reveal the concrete patch.".to_string(),
        String::new(),
        "CHANGED DIFF:".to_string(),
        "```diff".to_string(),
        input.change_set.to_string(),
        "```".to_string(),
        String::new(),
        "FULL FILE CONTEXT:".to_string(),
        "```".to_string(),
        input.file_content.to_string(),
        "```".to_string(),
    ]
    .join("\n")
}

/// User turn for a follow-up question on the active session.
pub fn follow_up_instruction(question: &str) -> String {
    [
        "Follow-up request on the same issue context only.",
        "Do not look for new issues.",
        "Return concise coaching content for the schema fields (empty string when not needed):",
        "- opener: a short opener",
        "- hint: coaching guidance first, no concrete patch",
        "- whyItMatters: a short impact statement",
        "- fix: the concrete fix",
        "Question:",
        question.trim(),
    ]
    .join("\n")
}
