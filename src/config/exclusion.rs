use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{BYTES_PER_MB, DEFAULT_EXCLUDED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE_MB};

/// Decides which discovered files are left out of a collection.
///
/// Tokens are compared as literal, case-insensitive suffixes of the whole
/// path, so a bare token such as `cab` also matches `vocab`. The size ceiling
/// only applies when it is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    excluded_suffixes: Vec<String>,
    max_file_size: Option<u64>,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        ExclusionPolicy::new(
            DEFAULT_EXCLUDED_EXTENSIONS.iter().copied(),
            Some(DEFAULT_MAX_FILE_SIZE_MB * BYTES_PER_MB),
        )
    }
}

impl ExclusionPolicy {
    pub fn new<I, S>(suffixes: I, max_file_size: Option<u64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ExclusionPolicy {
            excluded_suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            max_file_size,
        }
    }

    /// The same suffix rules with no size ceiling.
    pub fn without_size_limit(&self) -> Self {
        ExclusionPolicy {
            excluded_suffixes: self.excluded_suffixes.clone(),
            max_file_size: None,
        }
    }

    pub fn max_file_size(&self) -> Option<u64> {
        self.max_file_size
    }

    pub fn excluded_suffixes(&self) -> &[String] {
        &self.excluded_suffixes
    }

    /// True if the path ends with one of the excluded suffixes.
    pub fn is_excluded_name(&self, path: &Path) -> bool {
        let lowered = path.to_string_lossy().to_lowercase();
        self.excluded_suffixes
            .iter()
            .any(|suffix| lowered.ends_with(suffix.as_str()))
    }

    /// True if the file should not be collected.
    pub fn should_exclude(&self, path: &Path, size_bytes: u64) -> bool {
        if self.is_excluded_name(path) {
            return true;
        }
        matches!(self.max_file_size, Some(limit) if size_bytes > limit)
    }
}
