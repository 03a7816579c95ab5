//! CLI command implementation and per-category orchestration.

pub mod download;
pub mod error;

pub use download::{run, run_category, CategoryOutcome, Cli};
pub use error::CliError;
