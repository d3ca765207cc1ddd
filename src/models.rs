use serde::{Deserialize, Serialize};

use crate::error::{CollectError, FailureKind};

/// One source entry that could not be collected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntryFailure {
    pub source: String,
    pub kind: FailureKind,
    pub message: String,
}

impl EntryFailure {
    pub fn new(source: impl Into<String>, error: &CollectError) -> Self {
        EntryFailure {
            source: source.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of collecting a single category.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CategoryReport {
    pub name: String,
    pub produced_output: bool,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub skipped_excluded: usize,
    pub failures: Vec<EntryFailure>,
}

impl CategoryReport {
    pub fn new(name: impl Into<String>) -> Self {
        CategoryReport {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Aggregate result of one orchestrator run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CollectionSummary {
    pub produced_output: bool,
    pub cancelled: bool,
    pub categories: Vec<CategoryReport>,
}

impl CollectionSummary {
    pub fn files_copied(&self) -> usize {
        self.categories.iter().map(|c| c.files_copied).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.categories.iter().map(|c| c.failures.len()).sum()
    }

    pub fn report(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.name == name)
    }
}
