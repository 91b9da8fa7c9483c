//! Configuration loading and layering.
//!
//! Handles `.sidecoach.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{ConfigError, ConfigFile, Overrides, ProviderFile, Settings};
