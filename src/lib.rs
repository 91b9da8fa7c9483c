//! sidecoach — save-triggered AI code coaching (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod bridge;
pub mod coach;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod feedback;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod prompt;
pub mod providers;
pub mod store;
pub mod workspace;
