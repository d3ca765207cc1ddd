//! One complete collection run: stage, archive, clean up.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info, warn};

use crate::collectors::orchestrator::{Orchestrator, ProgressSink, ScheduleMode};
use crate::collectors::permission_tracker::PermissionTracker;
use crate::config::{Category, ExclusionPolicy};
use crate::constants::{
    DEFAULT_ARCHIVE_PREFIX, EXIT_ARCHIVE_CREATED, EXIT_ARCHIVE_FAILED, EXIT_CANCELLED,
    EXIT_NOTHING_COLLECTED, TIMESTAMP_FORMAT, UNKNOWN_HOSTNAME,
};
use crate::lifecycle::{CancelToken, RunContext, RunGuard, RunningFlag};
use crate::models::CollectionSummary;
use crate::utils::compress::{archive_name, create_archive, ArchiveOutcome};
use crate::utils::destination::resolve_destination;
use crate::utils::summary::{create_collection_summary, write_summary_file};

/// Host name used for the archive root and file name.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string())
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub categories: Vec<Category>,
    pub policy: ExclusionPolicy,
    pub mode: ScheduleMode,
    pub max_threads: Option<usize>,
    /// Output directory; the platform default is used when unset.
    pub destination_dir: Option<PathBuf>,
    pub archive_prefix: String,
    pub hostname: String,
    /// Write a JSON summary beside the archive.
    pub write_summary: bool,
}

impl SessionOptions {
    pub fn new(categories: Vec<Category>, policy: ExclusionPolicy) -> Self {
        SessionOptions {
            categories,
            policy,
            mode: ScheduleMode::default(),
            max_threads: None,
            destination_dir: None,
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            hostname: local_hostname(),
            write_summary: false,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    ArchiveCreated {
        path: PathBuf,
        summary: CollectionSummary,
    },
    /// Content was staged but the archive could not be written.
    ArchiveFailed { summary: CollectionSummary },
    NothingCollected { summary: CollectionSummary },
    Cancelled { summary: CollectionSummary },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::ArchiveCreated { .. } => EXIT_ARCHIVE_CREATED,
            RunOutcome::ArchiveFailed { .. } => EXIT_ARCHIVE_FAILED,
            RunOutcome::NothingCollected { .. } => EXIT_NOTHING_COLLECTED,
            RunOutcome::Cancelled { .. } => EXIT_CANCELLED,
        }
    }

    pub fn summary(&self) -> &CollectionSummary {
        match self {
            RunOutcome::ArchiveCreated { summary, .. }
            | RunOutcome::ArchiveFailed { summary }
            | RunOutcome::NothingCollected { summary }
            | RunOutcome::Cancelled { summary } => summary,
        }
    }

    pub fn archive_path(&self) -> Option<&Path> {
        match self {
            RunOutcome::ArchiveCreated { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Run a full collection. Fails with `SessionError::AlreadyRunning` if
/// `running` is already set.
pub fn run_collection(
    options: &SessionOptions,
    cancel: &CancelToken,
    running: &RunningFlag,
    progress: &dyn ProgressSink,
) -> Result<RunOutcome> {
    run_with_guard(options, cancel, running.acquire()?, progress)
}

/// Run a full collection under an already acquired run guard.
pub fn run_with_guard(
    options: &SessionOptions,
    cancel: &CancelToken,
    guard: RunGuard,
    progress: &dyn ProgressSink,
) -> Result<RunOutcome> {
    let destination = resolve_destination(options.destination_dir.as_deref())?;
    let ctx = RunContext::from_guard(guard)?;

    let outcome = stage_and_archive(options, cancel, &ctx, &destination, progress);

    if let Err(e) = ctx.close() {
        warn!("{:#}", e);
    }
    outcome
}

fn stage_and_archive(
    options: &SessionOptions,
    cancel: &CancelToken,
    ctx: &RunContext,
    destination: &Path,
    progress: &dyn ProgressSink,
) -> Result<RunOutcome> {
    info!(
        "Collecting {} categories on host {}",
        options.categories.len(),
        options.hostname
    );

    let summary = Orchestrator::new(options.categories.clone(), options.policy.clone())
        .with_mode(options.mode)
        .with_max_threads(options.max_threads)
        .run(ctx.staging_root(), cancel, progress)?;

    PermissionTracker::from_summary(&summary).report_failures();

    if summary.cancelled || cancel.is_cancelled() {
        warn!("Collection cancelled, no archive written");
        return Ok(RunOutcome::Cancelled { summary });
    }

    if !summary.produced_output {
        info!("No diagnostic files found");
        return Ok(RunOutcome::NothingCollected { summary });
    }

    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let path = destination.join(archive_name(
        &options.archive_prefix,
        &options.hostname,
        &timestamp,
    ));

    match create_archive(ctx.staging_root(), &path, &options.policy, &options.hostname) {
        Ok(ArchiveOutcome::Created(path)) => {
            if options.write_summary {
                write_summary(options, &summary, &path);
            }
            Ok(RunOutcome::ArchiveCreated { path, summary })
        }
        Ok(ArchiveOutcome::NothingToArchive) => Ok(RunOutcome::NothingCollected { summary }),
        Err(e) => {
            error!("Failed to create archive {}: {:#}", path.display(), e);
            Ok(RunOutcome::ArchiveFailed { summary })
        }
    }
}

fn write_summary(options: &SessionOptions, summary: &CollectionSummary, archive: &Path) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let result = create_collection_summary(&options.hostname, &timestamp, summary, Some(archive))
        .and_then(|json| write_summary_file(archive, &json));
    if let Err(e) = result {
        warn!("Could not write collection summary: {:#}", e);
    }
}
