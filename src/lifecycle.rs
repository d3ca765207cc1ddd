//! Run lifecycle: cancellation, the single-run flag and the staging root.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use tempfile::TempDir;

use crate::constants::STAGING_DIR_PREFIX;
use crate::error::SessionError;

/// Cooperative cancellation shared between the caller and the workers.
///
/// Checked before each category starts; a category already running is
/// allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token without registering any signal handler.
    pub fn manual() -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a token that is triggered by Ctrl+C.
    pub fn with_ctrlc() -> Result<Self, ctrlc::Error> {
        let token = CancelToken::manual();
        let flag = token.flag.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Process-wide "a run is in progress" flag.
#[derive(Debug, Clone, Default)]
pub struct RunningFlag {
    flag: Arc<AtomicBool>,
}

impl RunningFlag {
    pub fn new() -> Self {
        RunningFlag::default()
    }

    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Mark a run as started. Fails if one is already in progress.
    pub fn acquire(&self) -> Result<RunGuard, SessionError> {
        self.flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::AlreadyRunning)?;
        Ok(RunGuard {
            flag: self.flag.clone(),
        })
    }
}

/// Clears the running flag when dropped, whatever path the run took.
#[derive(Debug)]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Resources owned by one run.
///
/// The staging root is removed before the running flag is cleared.
#[derive(Debug)]
pub struct RunContext {
    staging: TempDir,
    guard: RunGuard,
}

impl RunContext {
    pub fn new(running: &RunningFlag) -> Result<Self> {
        RunContext::from_guard(running.acquire()?)
    }

    /// Start a run with an already acquired guard.
    pub fn from_guard(guard: RunGuard) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir()
            .context("Failed to create staging directory")?;
        debug!("Staging root: {}", staging.path().display());

        Ok(RunContext { staging, guard })
    }

    pub fn staging_root(&self) -> &Path {
        self.staging.path()
    }

    /// Remove the staging root and end the run.
    pub fn close(self) -> Result<()> {
        let RunContext { staging, guard } = self;
        let path = staging.path().to_path_buf();
        let result = staging
            .close()
            .context(format!("Failed to remove staging directory: {}", path.display()));
        drop(guard);
        result
    }
}
