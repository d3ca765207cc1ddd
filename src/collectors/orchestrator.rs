//! Runs the staging collector for every selected category.
//!
//! Two schedules are supported: a rayon pool with one task per category,
//! or one category at a time in registry order. Both report an integer
//! percentage after each category completes; the percentage never goes
//! backwards.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::collectors::collector::collect_category;
use crate::config::{check_distinct, Category, ExclusionPolicy};
use crate::constants::MAX_COLLECTION_THREADS;
use crate::lifecycle::CancelToken;
use crate::models::{CategoryReport, CollectionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// One task per category on a worker pool. No ordering between categories.
    #[default]
    Parallel,
    /// Registry order, one category at a time.
    Sequential,
}

/// Observer of collection progress.
pub trait ProgressSink: Send + Sync {
    /// Called after a category completes with `completed * 100 / total`.
    fn report(&self, percent: u8, category: &str);
}

/// Sink that discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8, _category: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn report(&self, percent: u8, category: &str) {
        self(percent, category)
    }
}

/// Completed-category counter shared by the workers.
struct ProgressCounter<'a> {
    total: usize,
    completed: Mutex<usize>,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressCounter<'a> {
    fn new(total: usize, sink: &'a dyn ProgressSink) -> Self {
        ProgressCounter {
            total,
            completed: Mutex::new(0),
            sink,
        }
    }

    fn complete(&self, category: &str) {
        // Reporting under the lock keeps observed percentages ordered
        let mut completed = match self.completed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *completed += 1;
        let percent = percentage(*completed, self.total);
        self.sink.report(percent, category);
    }
}

/// Integer-truncated `completed / total * 100`.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Collects a set of categories into a staging root.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    categories: Vec<Category>,
    policy: ExclusionPolicy,
    mode: ScheduleMode,
    max_threads: Option<usize>,
}

impl Orchestrator {
    pub fn new(categories: Vec<Category>, policy: ExclusionPolicy) -> Self {
        Orchestrator {
            categories,
            policy,
            mode: ScheduleMode::default(),
            max_threads: None,
        }
    }

    pub fn with_mode(mut self, mode: ScheduleMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Worker threads used in parallel mode.
    pub fn worker_count(&self) -> usize {
        let cap = self
            .max_threads
            .unwrap_or_else(num_cpus::get)
            .clamp(1, MAX_COLLECTION_THREADS);
        cap.min(self.categories.len()).max(1)
    }

    /// Collect every category. `produced_output` is true iff any category
    /// left files in the staging root.
    pub fn run(
        &self,
        staging_root: &Path,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> Result<CollectionSummary> {
        if self.categories.is_empty() {
            info!("No categories selected");
            return Ok(CollectionSummary::default());
        }
        check_distinct(&self.categories).context("Categories cannot share a staging directory")?;

        let counter = ProgressCounter::new(self.categories.len(), progress);
        let produced = AtomicBool::new(false);

        let run_one = |category: &Category| -> Option<CategoryReport> {
            if cancel.is_cancelled() {
                debug!("Cancelled before starting {}", category.name);
                return None;
            }
            info!("Collecting category: {}", category.name);
            let report = collect_category(category, staging_root, &self.policy);
            produced.fetch_or(report.produced_output, Ordering::SeqCst);
            counter.complete(&category.name);
            Some(report)
        };

        let reports: Vec<CategoryReport> = match self.mode {
            ScheduleMode::Sequential => self.categories.iter().filter_map(run_one).collect(),
            ScheduleMode::Parallel => {
                let workers = self.worker_count();
                debug!("Collecting {} categories on {} threads", self.categories.len(), workers);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("collector-{}", i))
                    .build()
                    .context("Failed to build collection thread pool")?;

                let results: Vec<Option<CategoryReport>> =
                    pool.install(|| self.categories.par_iter().map(run_one).collect());
                results.into_iter().flatten().collect()
            }
        };

        let cancelled = cancel.is_cancelled();
        if cancelled {
            warn!(
                "Collection cancelled after {} of {} categories",
                reports.len(),
                self.categories.len()
            );
        }

        Ok(CollectionSummary {
            produced_output: produced.load(Ordering::SeqCst),
            cancelled,
            categories: reports,
        })
    }
}
