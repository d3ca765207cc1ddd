//! # diag_collector
//!
//! Gathers diagnostic files of the N-able agent family from a Windows
//! endpoint into one archive that can be handed to support.
//!
//! ## Overview
//!
//! A run resolves the configured categories to file and directory sources,
//! copies every eligible file into a private staging tree (keeping its drive
//! and directory path so names never collide), exports event logs through an
//! external utility, and writes the staging tree into a single ZIP archive
//! rooted at the host name. All temporary directories are removed on every
//! exit path.
//!
//! ## Usage
//!
//! ```no_run
//! use diag_collector::collectors::orchestrator::NoProgress;
//! use diag_collector::config::CollectionConfig;
//! use diag_collector::lifecycle::{CancelToken, RunningFlag};
//! use diag_collector::session::{run_collection, SessionOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = CollectionConfig::default();
//! let registry = config.build_registry()?;
//! let options = SessionOptions::new(registry.all_categories().to_vec(), config.exclusion_policy());
//!
//! let outcome = run_collection(&options, &CancelToken::manual(), &RunningFlag::new(), &NoProgress)?;
//! println!("exit code {}", outcome.exit_code());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`config`]: Category registry, exclusion policy, path resolution and YAML configuration
//! - [`collectors`]: Staging collector, event log exporter, orchestrator and background handle
//! - [`utils`]: Archive creation, output directory resolution and summaries
//! - [`lifecycle`]: Cancellation, the single-run flag and the staging root
//! - [`session`]: One complete run and its exit code
//! - [`models`]: Per-category and per-run reports
//! - [`error`]: Error kinds
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Per-category and per-run reports
pub mod models;

/// Diagnostic collectors and scheduling
pub mod collectors;

/// Utility functions for archiving and reporting
pub mod utils;

/// Configuration management and category definitions
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Error kinds shared across modules
pub mod error;

/// Run lifecycle and cleanup
pub mod lifecycle;

/// Complete collection runs
pub mod session;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
