//! sidecoach — save-triggered AI code coaching.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use sidecoach::bridge::Bridge;
use sidecoach::coach::CoachingClient;
use sidecoach::config::Settings;
use sidecoach::constants;
use sidecoach::diff::GitChangeSource;
use sidecoach::env::Env;
use sidecoach::logging;
use sidecoach::models::Document;
use sidecoach::orchestrator::{CoachOrchestrator, Trigger};
use sidecoach::output::{JsonLinesSink, TerminalRenderer};
use sidecoach::store::{ConversationStore, SnapshotSink};
use sidecoach::workspace::Workspace;

use cli::args::{Cli, Command, FileArgs};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Command::Analyze(args) => run_file(&cli, args, Trigger::CURRENT_FILE).await,
        Command::Diff(args) => run_file(&cli, args, Trigger::CURRENT_DIFF).await,
        Command::All => run_all(&cli).await,
        Command::Serve => run_serve(&cli).await,
        Command::Version => run_version(),
    }
}

/// Print version information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}

/// Resolve the workspace and settings, and wire up the orchestrator.
fn build_orchestrator(cli: &Cli, sink: impl SnapshotSink + 'static, welcome: bool) -> Result<CoachOrchestrator> {
    let root = std::path::absolute(&cli.path)
        .with_context(|| format!("invalid workspace path {}", cli.path.display()))?;
    let workspace = Workspace::new(root);

    let settings = Settings::load(Some(workspace.root()), &Env::real(), &cli.overrides())
        .context("failed to load configuration")?;
    debug!(?settings, root = %workspace.root().display(), "settings resolved");

    let client = CoachingClient::from_settings(&settings).context("failed to set up provider")?;
    let store = if welcome {
        ConversationStore::new(sink)
    } else {
        ConversationStore::blank(sink)
    };

    Ok(CoachOrchestrator::new(
        settings,
        client,
        Arc::new(GitChangeSource),
        Arc::new(store),
        workspace,
    ))
}

/// `sidecoach analyze` and `sidecoach diff`.
async fn run_file(cli: &Cli, args: &FileArgs, trigger: Trigger) -> Result<()> {
    let coach = build_orchestrator(cli, TerminalRenderer::new(), false)?;
    let path = coach.workspace().resolve(&args.file);
    let document = open(&path, cli.language.as_deref()).await?;

    let outcome = coach.analyze_document(&document, trigger).await?;
    if let Some(note) = cli::outcome_note(&outcome) {
        println!("{note}");
    }
    Ok(())
}

/// `sidecoach all`.
async fn run_all(cli: &Cli) -> Result<()> {
    let coach = build_orchestrator(cli, TerminalRenderer::new(), false)?;
    let summary = coach
        .analyze_all_changes()
        .await
        .context("failed to analyze changed files")?;
    println!("{}", cli::summary_line(&summary));
    Ok(())
}

/// `sidecoach serve`.
async fn run_serve(cli: &Cli) -> Result<()> {
    let coach = build_orchestrator(cli, JsonLinesSink::stdout(), true)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Bridge::new(coach)
        .serve(stdin)
        .await
        .context("bridge I/O failed")
}

async fn open(path: &Path, language: Option<&str>) -> Result<Document> {
    Document::open(path, language)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
