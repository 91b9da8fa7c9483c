//! Stdio bridge to an editor host.
//!
//! The host writes one JSON command per line on stdin; the bridge answers
//! with `messages` snapshots on stdout (through the store's sink).
//! Commands are handled one at a time, in arrival order.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::models::Document;
use crate::orchestrator::{CoachOrchestrator, Trigger};

/// A command or notification from the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inbound {
    /// Review the active document in full.
    AnalyzeCurrent,
    /// Review every file with uncommitted changes.
    AnalyzeAllChanges,
    /// Ask about the latest run.
    FollowUp { question: String },
    /// The "Yes, do it" action of the no-diff prompt.
    #[serde(rename_all = "camelCase")]
    AnalyzeWholeFile { file_name: String },
    /// The host switched to another document.
    #[serde(rename_all = "camelCase")]
    ActiveDocument {
        path: String,
        #[serde(default)]
        language_id: Option<String>,
    },
    /// The host saved a document.
    #[serde(rename_all = "camelCase")]
    DocumentSaved {
        path: String,
        #[serde(default)]
        language_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct ActiveDocument {
    path: PathBuf,
    language_id: Option<String>,
}

/// Long-lived bridge state: the orchestrator plus the host's active document.
pub struct Bridge {
    coach: CoachOrchestrator,
    active: Option<ActiveDocument>,
}

impl Bridge {
    pub fn new(coach: CoachOrchestrator) -> Self {
        Self {
            coach,
            active: None,
        }
    }

    pub fn coach(&self) -> &CoachOrchestrator {
        &self.coach
    }

    /// Push the initial snapshot, then handle lines until EOF.
    pub async fn serve<R>(&mut self, reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let has_api_key = self.coach.settings().has_api_key();
        self.coach.store().set_api_key_status(has_api_key);
        info!(has_api_key, "bridge ready");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Inbound>(line) {
                Ok(command) => self.handle(command).await,
                Err(e) => warn!("ignoring malformed bridge line: {e}"),
            }
        }
        info!("stdin closed, bridge stopping");
        Ok(())
    }

    /// Handle one command. Failures are logged; the store already carries
    /// any user-visible status.
    pub async fn handle(&mut self, command: Inbound) {
        debug!(?command, "bridge command");
        match command {
            Inbound::AnalyzeCurrent => {
                let Some(document) = self.open_active().await else {
                    return;
                };
                if let Err(e) = self
                    .coach
                    .analyze_document(&document, Trigger::CURRENT_FILE)
                    .await
                {
                    warn!("analysis failed: {e}");
                }
            }
            Inbound::AnalyzeAllChanges => match self.coach.analyze_all_changes().await {
                Ok(summary) => info!("{}", summary.message()),
                Err(e) => warn!("analyze-all failed: {e}"),
            },
            Inbound::FollowUp { question } => {
                if question.trim().is_empty() {
                    return;
                }
                if let Err(e) = self.coach.follow_up(&question).await {
                    warn!("follow-up failed: {e}");
                }
            }
            Inbound::AnalyzeWholeFile { file_name } => {
                let file_name = file_name.trim();
                if file_name.is_empty() {
                    return;
                }
                if let Err(e) = self.coach.analyze_whole_file(Path::new(file_name)).await {
                    warn!(file = file_name, "whole-file analysis failed: {e}");
                }
            }
            Inbound::ActiveDocument { path, language_id } => {
                self.set_active(&path, language_id);
            }
            Inbound::DocumentSaved { path, language_id } => {
                self.set_active(&path, language_id);
                let Some(document) = self.open_active().await else {
                    return;
                };
                if let Err(e) = self.coach.analyze_document(&document, Trigger::ON_SAVE).await {
                    warn!("save analysis failed: {e}");
                }
            }
        }
    }

    fn set_active(&mut self, path: &str, language_id: Option<String>) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }
        self.active = Some(ActiveDocument {
            path: self.coach.workspace().resolve(Path::new(path)),
            language_id: language_id.filter(|l| !l.trim().is_empty()),
        });
    }

    async fn open_active(&self) -> Option<Document> {
        let Some(active) = &self.active else {
            info!("no active document; open a file to analyze first");
            return None;
        };
        match Document::open(&active.path, active.language_id.as_deref()).await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(file = %active.path.display(), "failed to read document: {e}");
                None
            }
        }
    }
}
