//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use colored::Colorize;

use sidecoach::orchestrator::{AnalysisOutcome, BatchSummary, SkipReason};

/// One line describing a run that printed no bubbles, or `None` when the
/// conversation output already says everything.
pub fn outcome_note(outcome: &AnalysisOutcome) -> Option<String> {
    let note = match outcome {
        AnalysisOutcome::Skipped(SkipReason::Disabled) => "sidecoach is disabled in config".to_string(),
        AnalysisOutcome::Skipped(SkipReason::AnalyzeOnSaveOff) => {
            "analyze_on_save is off".to_string()
        }
        AnalysisOutcome::Skipped(SkipReason::NotAFile) => "not a file on disk".to_string(),
        AnalysisOutcome::Skipped(SkipReason::EmptyContent) => "file is empty, nothing to review".to_string(),
        AnalysisOutcome::Skipped(SkipReason::TooLarge { bytes, limit }) => format!(
            "file too large ({}KB, limit {}KB)",
            bytes.div_ceil(1024),
            limit / 1024
        ),
        AnalysisOutcome::NoDiff | AnalysisOutcome::AllClear | AnalysisOutcome::Issue { .. } => {
            return None;
        }
    };
    Some(format!("{} {}", "·".dimmed(), note.dimmed()))
}

/// Final line of `sidecoach all`.
pub fn summary_line(summary: &BatchSummary) -> String {
    let text = summary.message();
    if summary.failed > 0 {
        format!("{}", text.yellow().bold())
    } else {
        format!("{}", text.green().bold())
    }
}
