//! Diagnostic collection implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     CollectionHandle (background)       │
//! ├─────────────────────────────────────────┤
//! │            Orchestrator                 │
//! │      parallel pool │ sequential         │
//! ├─────────────────────────────────────────┤
//! │   StagingCollector (one per category)   │
//! │  ┌──────────────┬──────────────────┐    │
//! │  │ Path sources │ EventLogExporter │    │
//! │  └──────────────┴──────────────────┘    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use diag_collector::collectors::orchestrator::{NoProgress, Orchestrator};
//! use diag_collector::config::CollectionConfig;
//! use diag_collector::lifecycle::CancelToken;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = CollectionConfig::default();
//! let registry = config.build_registry()?;
//!
//! let summary = Orchestrator::new(registry.all_categories().to_vec(), config.exclusion_policy())
//!     .run(Path::new("/tmp/staging"), &CancelToken::manual(), &NoProgress)?;
//! println!("Copied {} files", summary.files_copied());
//! # Ok(())
//! # }
//! ```

/// Per-category staging collector
pub mod collector;

/// Event log export through an external utility
pub mod event_log;

/// Scheduling of categories and progress reporting
pub mod orchestrator;

/// Background collection thread
pub mod handle;

/// Permission error tracking and reporting
pub mod permission_tracker;
