//! Running a collection on a background thread.
//!
//! The caller keeps a [`CollectionHandle`] to receive progress, request
//! cancellation and collect the final outcome, so an interactive front-end
//! never blocks on collection work.

use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{bounded, Receiver};
use log::debug;

use crate::constants::PROGRESS_CHANNEL_CAPACITY;
use crate::lifecycle::{CancelToken, RunningFlag};
use crate::session::{run_with_guard, RunOutcome, SessionOptions};

/// Messages sent from the collection thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionProgress {
    /// A category finished; `percent` never decreases.
    Progress { percent: u8, category: String },
    /// The run ended with this process exit code.
    Finished { exit_code: u8 },
}

pub struct CollectionHandle {
    /// Receiver for progress updates from the collection thread.
    pub progress_rx: Receiver<CollectionProgress>,
    cancel: CancelToken,
    running: RunningFlag,
    thread: Option<thread::JoinHandle<Result<RunOutcome>>>,
}

impl CollectionHandle {
    /// Start a run on a new thread.
    ///
    /// Fails immediately with `SessionError::AlreadyRunning` if `running`
    /// is already set.
    pub fn spawn(options: SessionOptions, cancel: CancelToken, running: RunningFlag) -> Result<Self> {
        let guard = running.acquire()?;
        let (progress_tx, progress_rx) = bounded::<CollectionProgress>(PROGRESS_CHANNEL_CAPACITY);
        let thread_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name("diag-collection".into())
            .spawn(move || {
                let sink_tx = progress_tx.clone();
                let sink = move |percent: u8, category: &str| {
                    // Never block the worker on a slow observer
                    let _ = sink_tx.try_send(CollectionProgress::Progress {
                        percent,
                        category: category.to_string(),
                    });
                };

                let outcome = run_with_guard(&options, &thread_cancel, guard, &sink);
                let exit_code = match &outcome {
                    Ok(outcome) => outcome.exit_code(),
                    Err(_) => crate::constants::EXIT_ARCHIVE_FAILED,
                };
                let _ = progress_tx.send(CollectionProgress::Finished { exit_code });
                debug!("Collection thread finished with exit code {}", exit_code);
                outcome
            })
            .context("Failed to spawn collection thread")?;

        Ok(CollectionHandle {
            progress_rx,
            cancel,
            running,
            thread: Some(thread),
        })
    }

    /// Stop starting new categories; the run then ends as cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Block until the run ends.
    pub fn wait(mut self) -> Result<RunOutcome> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| anyhow!("collection thread already joined"))?;
        thread
            .join()
            .map_err(|_| anyhow!("collection thread panicked"))?
    }
}
