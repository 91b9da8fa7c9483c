//! Clap argument types.

use clap::Parser;
use std::path::PathBuf;

use sidecoach::config::Overrides;
use sidecoach::models::{NoiseLevel, ProviderName, Subtlety};

/// Save-triggered AI code coaching: hint first, fix second.
#[derive(Parser, Debug)]
#[command(name = "sidecoach", version = sidecoach::constants::VERSION)]
pub struct Cli {
    /// Workspace root (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Language identifier override (default: inferred from the extension).
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// LLM provider.
    #[arg(long, global = true)]
    pub provider: Option<ProviderName>,

    /// Model to use (default: the provider's default model).
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// How chatty the coach is (sampling temperature).
    #[arg(long, global = true)]
    pub noise: Option<NoiseLevel>,

    /// Tone of the feedback.
    #[arg(long, global = true)]
    pub subtlety: Option<Subtlety>,

    /// Verbose logging on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Review a whole file.
    Analyze(FileArgs),

    /// Review a file's uncommitted changes; offers a whole-file review when there are none.
    Diff(FileArgs),

    /// Review every file with uncommitted changes.
    All,

    /// Run the JSON-lines bridge on stdin/stdout.
    Serve,

    /// Print version information.
    Version,
}

/// A single file to review.
#[derive(Parser, Debug)]
pub struct FileArgs {
    /// File to review, relative to the workspace root or absolute.
    pub file: PathBuf,
}

impl Cli {
    /// Flag values that override every other config layer.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider,
            model: self.model.clone(),
            noise_level: self.noise,
            subtlety: self.subtlety,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_global_flags() {
        let cli = Cli::try_parse_from([
            "sidecoach",
            "analyze",
            "src/app.js",
            "--noise",
            "chatty",
            "--subtlety",
            "strict",
            "--provider",
            "anthropic",
        ])
        .unwrap();
        match &cli.command {
            Command::Analyze(args) => assert_eq!(args.file, PathBuf::from("src/app.js")),
            other => panic!("expected Analyze, got {other:?}"),
        }
        let overrides = cli.overrides();
        assert_eq!(overrides.noise_level, Some(NoiseLevel::Chatty));
        assert_eq!(overrides.subtlety, Some(Subtlety::Strict));
        assert_eq!(overrides.provider, Some(ProviderName::Anthropic));
    }

    #[test]
    fn defaults_leave_overrides_empty() {
        let cli = Cli::try_parse_from(["sidecoach", "all"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(!cli.verbose);
        assert!(cli.model.is_none());
        assert!(cli.noise.is_none());
    }

    #[test]
    fn diff_requires_a_file() {
        assert!(Cli::try_parse_from(["sidecoach", "diff"]).is_err());
    }

    #[test]
    fn rejects_unknown_noise_level() {
        assert!(Cli::try_parse_from(["sidecoach", "serve", "--noise", "loud"]).is_err());
    }

    #[test]
    fn verbose_short_flag() {
        let cli = Cli::try_parse_from(["sidecoach", "-v", "serve"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Serve));
    }
}
