//! Permission error tracking and reporting
//!
//! Gathers sources that could not be read for lack of privileges and tells
//! the operator how to retry with an elevated account.

use log::warn;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::error::FailureKind;
use crate::models::CollectionSummary;

/// Tracks sources that failed due to permission errors
#[derive(Debug, Clone, Default)]
pub struct PermissionTracker {
    failed_sources: Arc<Mutex<BTreeSet<String>>>,
}

impl PermissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker pre-filled with the permission failures of a finished run
    pub fn from_summary(summary: &CollectionSummary) -> Self {
        let tracker = Self::new();
        summary
            .categories
            .iter()
            .flat_map(|c| c.failures.iter())
            .filter(|f| f.kind == FailureKind::PermissionDenied)
            .for_each(|f| tracker.record_permission_failure(&f.source));
        tracker
    }

    fn sources(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        match self.failed_sources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record_permission_failure(&self, source: &str) {
        self.sources().insert(source.to_string());
    }

    pub fn failure_count(&self) -> usize {
        self.sources().len()
    }

    pub fn should_suggest_elevation(&self) -> bool {
        !self.sources().is_empty()
    }

    /// Log permission failures and how to avoid them
    pub fn report_failures(&self) {
        let failures = self.sources();
        if failures.is_empty() {
            return;
        }

        warn!("Permission issues summary");
        warn!(
            "The following {} source(s) could not be read due to insufficient permissions:",
            failures.len()
        );
        for source in failures.iter() {
            warn!("  - {}", source);
        }

        #[cfg(target_os = "windows")]
        {
            warn!("Run the collector from an elevated prompt (Run as administrator),");
            warn!("or as the SYSTEM account through the RMM agent.");
        }

        #[cfg(not(target_os = "windows"))]
        {
            warn!(
                "Re-run with sudo: sudo {}",
                std::env::args().collect::<Vec<_>>().join(" ")
            );
        }

        warn!("Collection continued for accessible sources.");
    }
}
