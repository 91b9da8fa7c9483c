//! Coaching orchestrator: one pipeline run per trigger.
//!
//! Ties the pieces together in a fixed order: skip checks, change
//! extraction, prompt + provider call, formatting, store update. Owns the
//! [`SessionSlot`] so stale completions never overwrite a newer session.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::coach::{CoachError, CoachingClient, SessionSlot};
use crate::config::Settings;
use crate::constants::{
    STATUS_ALL_CLEAR, STATUS_FAILED, STATUS_ISSUE_FOUND, STATUS_NO_DIFF, STATUS_TIMED_OUT,
    STATUS_TOO_LARGE,
};
use crate::diff::ChangeSource;
use crate::feedback::{self, messages};
use crate::models::{Document, Message, now_timestamp};
use crate::prompt::PromptInput;
use crate::store::ConversationStore;
use crate::workspace::Workspace;

/// What started an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Save-triggered runs respect `analyze_on_save`.
    pub triggered_by_save: bool,
    /// An empty diff produces the no-diff prompt instead of a review.
    pub require_diff: bool,
}

impl Trigger {
    /// A document was saved.
    pub const ON_SAVE: Trigger = Trigger {
        triggered_by_save: true,
        require_diff: true,
    };
    /// "Analyze current file".
    pub const CURRENT_FILE: Trigger = Trigger {
        triggered_by_save: false,
        require_diff: false,
    };
    /// "Analyze current file's diff".
    pub const CURRENT_DIFF: Trigger = Trigger {
        triggered_by_save: false,
        require_diff: true,
    };
    /// One file of "analyze all changed files".
    pub const BATCH: Trigger = Trigger {
        triggered_by_save: true,
        require_diff: false,
    };
}

/// Why a run stopped before reaching the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    AnalyzeOnSaveOff,
    NotAFile,
    EmptyContent,
    TooLarge { bytes: u64, limit: u64 },
}

/// Result of a single pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Skipped(SkipReason),
    /// A diff was required and none was found.
    NoDiff,
    AllClear,
    /// An issue was reported as this many bubbles.
    Issue { bubbles: usize },
}

/// Totals for "analyze all changed files".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub analyzed: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// `analyzed N changed file(s)[, M failed]`.
    pub fn message(&self) -> String {
        if self.failed > 0 {
            format!(
                "analyzed {} changed file(s), {} failed",
                self.analyzed, self.failed
            )
        } else {
            format!("analyzed {} changed file(s)", self.analyzed)
        }
    }
}

/// Clears the thinking label when dropped, on every exit path.
struct BusyGuard<'a> {
    store: &'a ConversationStore,
}

impl<'a> BusyGuard<'a> {
    fn new(store: &'a ConversationStore, label: String) -> Self {
        store.set_thinking_label(label);
        Self { store }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.set_thinking_label("");
    }
}

/// Runs the coaching pipeline against one workspace.
pub struct CoachOrchestrator {
    settings: Settings,
    client: CoachingClient,
    changes: Arc<dyn ChangeSource>,
    store: Arc<ConversationStore>,
    workspace: Workspace,
    sessions: SessionSlot,
}

impl CoachOrchestrator {
    pub fn new(
        settings: Settings,
        client: CoachingClient,
        changes: Arc<dyn ChangeSource>,
        store: Arc<ConversationStore>,
        workspace: Workspace,
    ) -> Self {
        Self {
            settings,
            client,
            changes,
            store,
            workspace,
            sessions: SessionSlot::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run the full pipeline for one document.
    ///
    /// Skips and the no-diff case are `Ok` outcomes. Errors have already
    /// been reflected in the store's result status when they are returned.
    pub async fn analyze_document(
        &self,
        document: &Document,
        trigger: Trigger,
    ) -> Result<AnalysisOutcome, CoachError> {
        let settings = &self.settings;
        let file_name = document.file_name();
        self.store.set_api_key_status(settings.has_api_key());

        if let Some(reason) = self.skip_reason(document, trigger) {
            debug!(file = %file_name, ?reason, "skipping analysis");
            if matches!(reason, SkipReason::TooLarge { .. }) {
                self.store.set_result_status(STATUS_TOO_LARGE);
            }
            return Ok(AnalysisOutcome::Skipped(reason));
        }

        let change_set = match self.working_diff(document).await {
            Ok(diff) => diff,
            Err(e) => {
                warn!(file = %file_name, "change extraction failed: {e}");
                self.store.set_result_status(STATUS_FAILED);
                return Err(e);
            }
        };

        if trigger.require_diff && change_set.trim().is_empty() {
            info!(file = %file_name, "no diff found, offering whole-file review");
            self.store
                .add_messages([messages::no_diff_prompt(&file_name, settings.subtlety)]);
            self.store.set_result_status(STATUS_NO_DIFF);
            return Ok(AnalysisOutcome::NoDiff);
        }

        self.store.set_result_status("");
        let _busy = BusyGuard::new(&self.store, format!("Thinking... {}", document.base_name()));

        let ticket = self.sessions.begin();
        let input = PromptInput {
            file_content: &document.text,
            language_id: &document.language_id,
            change_set: &change_set,
            noise_level: settings.noise_level,
            subtlety: settings.subtlety,
        };
        let (feedback_text, session) =
            match self.client.request_coaching(settings, &file_name, input).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(file = %file_name, "coaching request failed: {e}");
                    self.store.set_result_status(failure_status(&e));
                    return Err(e);
                }
            };

        if !self.sessions.commit_analysis(ticket, session) {
            info!(file = %file_name, "a newer analysis finished first; keeping its session");
        }

        let Some(text) = feedback_text else {
            self.store
                .add_messages([messages::all_clear(&file_name, settings.subtlety)]);
            self.store.set_result_status(STATUS_ALL_CLEAR);
            return Ok(AnalysisOutcome::AllClear);
        };

        let timestamp = now_timestamp();
        let bubbles: Vec<Message> = feedback::split_into_bubbles(&text)
            .iter()
            .map(|bubble| {
                Message::assistant(
                    timestamp.clone(),
                    file_name.clone(),
                    feedback::normalize_for_hint_mode(bubble),
                )
            })
            .collect();
        let count = bubbles.len();
        info!(file = %file_name, bubbles = count, "issue reported");
        self.store.add_messages(bubbles);
        self.store.set_result_status(STATUS_ISSUE_FOUND);
        Ok(AnalysisOutcome::Issue { bubbles: count })
    }

    fn skip_reason(&self, document: &Document, trigger: Trigger) -> Option<SkipReason> {
        let settings = &self.settings;
        if !settings.enabled {
            return Some(SkipReason::Disabled);
        }
        if trigger.triggered_by_save && !settings.analyze_on_save {
            return Some(SkipReason::AnalyzeOnSaveOff);
        }
        if !document.is_file {
            return Some(SkipReason::NotAFile);
        }
        if document.text.trim().is_empty() {
            return Some(SkipReason::EmptyContent);
        }
        let bytes = document.byte_len() as u64;
        let limit = settings.max_file_bytes();
        if bytes > limit {
            info!(
                file = %document.file_name(),
                size_kb = bytes.div_ceil(1024),
                "skipping: file too large"
            );
            return Some(SkipReason::TooLarge { bytes, limit });
        }
        None
    }

    async fn working_diff(&self, document: &Document) -> Result<String, CoachError> {
        let Some(root) = self.workspace.root_for(&document.path).await else {
            return Ok(String::new());
        };
        self.changes
            .working_diff(document, &root)
            .await
            .map_err(|e| CoachError::Transport(format!("diff failed: {e}")))
    }

    /// Read `path` from disk and analyze it as a whole file.
    pub async fn analyze_whole_file(&self, path: &Path) -> Result<AnalysisOutcome, CoachError> {
        let path = self.workspace.resolve(path);
        let document = open_document(&path, None).await?;
        self.analyze_document(&document, Trigger::CURRENT_FILE).await
    }

    /// Analyze every file with uncommitted changes, one after another.
    ///
    /// A file that cannot be read, diffed, or reviewed counts as failed and
    /// does not stop the batch. Skipped and all-clear files count as analyzed.
    pub async fn analyze_all_changes(&self) -> Result<BatchSummary, CoachError> {
        let files = self
            .changes
            .changed_files(self.workspace.root())
            .await
            .map_err(|e| CoachError::Transport(format!("failed to list changed files: {e}")))?;
        info!(count = files.len(), "analyzing changed files");

        let mut summary = BatchSummary::default();
        for path in files {
            let result = match open_document(&path, None).await {
                Ok(document) => self.analyze_document(&document, Trigger::BATCH).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(outcome) => {
                    debug!(file = %path.display(), ?outcome, "analyzed");
                    summary.analyzed += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), "analyze-all error: {e}");
                    summary.failed += 1;
                }
            }
        }
        info!(
            analyzed = summary.analyzed,
            failed = summary.failed,
            "analyze-all finished"
        );
        Ok(summary)
    }

    /// Answer a follow-up question about the most recent run.
    ///
    /// The question and the answer are added to the store under the latest
    /// run's key. Returns the displayed answer, or `None` when the question
    /// was blank or the model answered with nothing. Failures are also
    /// shown in the conversation as a notice from the system sender.
    pub async fn follow_up(&self, question: &str) -> Result<Option<String>, CoachError> {
        self.ask_follow_up(question)
            .await
            .inspect_err(|e| self.report_follow_up_failure(e))
    }

    async fn ask_follow_up(&self, question: &str) -> Result<Option<String>, CoachError> {
        let settings = &self.settings;
        self.store.set_api_key_status(settings.has_api_key());

        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let run = self.store.latest_run_context().ok_or_else(|| {
            CoachError::State("Run an analysis first, then ask a follow-up.".to_string())
        })?;
        self.client.ensure_ready(settings)?;

        // The latest run may be a no-diff prompt for a file that was never
        // sent to the model; its follow-up must not continue another file.
        let active = self
            .sessions
            .active()
            .filter(|active| active.session.file_name == run.file_name)
            .ok_or_else(|| {
                CoachError::State(format!(
                    "No coaching session for {}. Run an analysis of it first, then ask a follow-up.",
                    run.file_name
                ))
            })?;

        let _busy = BusyGuard::new(&self.store, "Thinking... follow-up".to_string());
        self.store.add_messages([Message::user(
            run.timestamp.clone(),
            run.file_name.clone(),
            question,
        )]);

        let (answer, session) = self
            .client
            .request_follow_up(settings, Some(&active.session), question)
            .await?;

        let Some(answer) = answer else {
            debug!(file = %run.file_name, "empty follow-up answer");
            return Ok(None);
        };
        if !self.sessions.commit_follow_up(active.generation, session) {
            info!(file = %run.file_name, "session changed during follow-up; not extending it");
        }

        let content = feedback::normalize_for_hint_mode(&answer);
        self.store.add_messages([Message::assistant(
            run.timestamp,
            run.file_name,
            content.clone(),
        )]);
        Ok(Some(content))
    }

    fn report_follow_up_failure(&self, err: &CoachError) {
        let text = match err {
            CoachError::State(msg) => msg.clone(),
            other => format!("Follow-up failed: {other}"),
        };
        self.store.add_messages([messages::notice(text)]);
        if !matches!(err, CoachError::State(_)) {
            self.store.set_result_status(failure_status(err));
        }
    }
}

fn failure_status(err: &CoachError) -> &'static str {
    match err {
        CoachError::Timeout(_) => STATUS_TIMED_OUT,
        _ => STATUS_FAILED,
    }
}

async fn open_document(path: &Path, language_id: Option<&str>) -> Result<Document, CoachError> {
    Document::open(path, language_id)
        .await
        .map_err(|e| CoachError::Transport(format!("failed to read {}: {e}", path.display())))
}
