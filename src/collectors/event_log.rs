//! Event log export through an external utility.
//!
//! Each configured channel is exported by one invocation of the utility
//! (`wevtutil epl <channel> <file>` by default). A channel that fails is
//! logged and left out; the remaining channels are still exported.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::Exporter;
use crate::constants::{
    DEFAULT_EVENT_LOG_EXTENSION, DEFAULT_EXPORT_TIMEOUT_SECS, EVENT_LOGS_DIR,
    EXPORT_POLL_INTERVAL_MS, TIMESTAMP_FORMAT,
};
use crate::error::CollectError;

/// Channels exported by one call to [`EventLogExporter::export_channels`].
#[derive(Debug)]
pub struct ExportResult {
    pub dir: PathBuf,
    pub exported: Vec<String>,
    pub failed: Vec<(String, CollectError)>,
}

#[derive(Debug, Clone)]
pub struct EventLogExporter {
    utility: String,
    args: Vec<String>,
    channels: Vec<String>,
    extension: String,
    timeout: Duration,
}

impl EventLogExporter {
    /// `args` may contain `{channel}` and `{output}` placeholders.
    pub fn new(utility: impl Into<String>, args: Vec<String>, channels: Vec<String>) -> Self {
        EventLogExporter {
            utility: utility.into(),
            args,
            channels,
            extension: DEFAULT_EVENT_LOG_EXTENSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_EXPORT_TIMEOUT_SECS),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// File name for a channel export, e.g. `Application_20240101_120000.evtx`.
    pub fn channel_file_name(&self, channel: &str, timestamp: &str) -> String {
        let safe = channel.replace(['/', '\\'], "_");
        format!("{}_{}.{}", safe, timestamp, self.extension)
    }

    fn command_args(&self, channel: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{channel}", channel).replace("{output}", &output))
            .collect()
    }

    /// Export one channel to `output`. A partial file is removed on failure.
    pub fn export_channel(&self, channel: &str, output: &Path) -> Result<(), CollectError> {
        let result = self.run_utility(channel, output);
        if result.is_err() && output.exists() {
            if let Err(e) = fs::remove_file(output) {
                debug!("Could not remove partial export {}: {}", output.display(), e);
            }
        }
        result
    }

    fn run_utility(&self, channel: &str, output: &Path) -> Result<(), CollectError> {
        let export_err = |message: String| CollectError::Export {
            name: channel.to_string(),
            message,
        };

        let mut child = Command::new(&self.utility)
            .args(self.command_args(channel, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| export_err(format!("failed to start {}: {}", self.utility, e)))?;

        match wait_with_timeout(&mut child, self.timeout) {
            Ok(Some(status)) if status.success() => {}
            Ok(Some(status)) => return Err(export_err(format!("{} exited with {}", self.utility, status))),
            Ok(None) => return Err(export_err(format!("timed out after {:?}", self.timeout))),
            Err(e) => return Err(export_err(format!("failed waiting on {}: {}", self.utility, e))),
        }

        if !output.is_file() {
            return Err(export_err("utility reported success but wrote no file".to_string()));
        }
        Ok(())
    }

    /// Export every channel into `output_dir/EventLogs`.
    pub fn export_channels(&self, output_dir: &Path) -> Result<ExportResult> {
        let logs_dir = output_dir.join(EVENT_LOGS_DIR);
        fs::create_dir_all(&logs_dir)
            .context(format!("Failed to create directory: {}", logs_dir.display()))?;

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut result = ExportResult {
            dir: logs_dir,
            exported: Vec::new(),
            failed: Vec::new(),
        };

        for channel in &self.channels {
            let file = result.dir.join(self.channel_file_name(channel, &timestamp));
            match self.export_channel(channel, &file) {
                Ok(()) => {
                    info!("Exported event log: {}", channel);
                    result.exported.push(channel.clone());
                }
                Err(e) => {
                    warn!("Failed to export event log {}: {}", channel, e);
                    result.failed.push((channel.clone(), e));
                }
            }
        }

        Ok(result)
    }
}

impl Exporter for EventLogExporter {
    fn name(&self) -> &str {
        "event_logs"
    }

    fn export(&self, output_dir: &Path) -> Result<PathBuf> {
        Ok(self.export_channels(output_dir)?.dir)
    }
}

/// Wait for `child` to exit, killing it once `timeout` elapses.
///
/// Returns `Ok(None)` when the child had to be killed.
pub fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    let poll = Duration::from_millis(EXPORT_POLL_INTERVAL_MS);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(poll.min(deadline - now));
    }
}
