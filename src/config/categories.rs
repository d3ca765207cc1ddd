use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::error::RegistryError;

/// A unit of work that produces files instead of reading existing ones.
pub trait Exporter: fmt::Debug + Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Write output somewhere under `output_dir` and return the directory
    /// holding it. The directory may be empty or missing if nothing was produced.
    fn export(&self, output_dir: &Path) -> Result<PathBuf>;
}

/// One item of a category.
#[derive(Debug, Clone)]
pub enum SourceEntry {
    /// File or directory path, possibly containing environment variable tokens.
    Path(String),
    /// Pluggable exporter invoked at collection time.
    Exporter(Arc<dyn Exporter>),
}

impl SourceEntry {
    pub fn path(raw: impl Into<String>) -> Self {
        SourceEntry::Path(raw.into())
    }

    pub fn exporter<E: Exporter + 'static>(exporter: E) -> Self {
        SourceEntry::Exporter(Arc::new(exporter))
    }

    /// Label used in logs and failure records.
    pub fn label(&self) -> String {
        match self {
            SourceEntry::Path(raw) => raw.clone(),
            SourceEntry::Exporter(exporter) => format!("<{}>", exporter.name()),
        }
    }
}

/// Named group of diagnostic sources.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub sources: Vec<SourceEntry>,
    /// Whether the size ceiling applies to this category's path sources.
    pub size_limited: bool,
}

impl Category {
    pub fn new(name: impl Into<String>, sources: Vec<SourceEntry>) -> Self {
        Category {
            name: name.into(),
            sources,
            size_limited: true,
        }
    }

    pub fn with_size_limit(mut self, size_limited: bool) -> Self {
        self.size_limited = size_limited;
        self
    }

    /// Directory name of this category inside the staging root.
    pub fn staging_dir_name(&self) -> String {
        let name: String = self
            .name
            .trim()
            .chars()
            .filter_map(|c| match c {
                ' ' | '-' => Some('_'),
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => None,
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect();

        if name.is_empty() || name.chars().all(|c| c == '.') {
            "category".to_string()
        } else {
            name
        }
    }
}

/// Ordered, immutable mapping of category name to sources.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

/// Check that every category has its own name and its own staging directory.
///
/// Directory names are compared case-insensitively since the staging tree
/// may live on a case-insensitive filesystem.
pub fn check_distinct(categories: &[Category]) -> Result<(), RegistryError> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut dirs: HashMap<String, &str> = HashMap::new();

    for category in categories {
        if !names.insert(category.name.as_str()) {
            return Err(RegistryError::DuplicateCategory(category.name.clone()));
        }
        let dir = category.staging_dir_name();
        if let Some(first) = dirs.insert(dir.to_lowercase(), category.name.as_str()) {
            return Err(RegistryError::StagingDirClash {
                first: first.to_string(),
                second: category.name.clone(),
                dir,
            });
        }
    }
    Ok(())
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Result<Self, RegistryError> {
        check_distinct(&categories)?;
        Ok(CategoryRegistry { categories })
    }

    pub fn all_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Result<&Category, RegistryError> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| RegistryError::UnknownCategory(name.to_string()))
    }

    pub fn sources_for(&self, name: &str) -> Result<&[SourceEntry], RegistryError> {
        self.get(name).map(|c| c.sources.as_slice())
    }

    /// Categories matching `names`, in registry order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Category>, RegistryError> {
        for name in names {
            self.get(name.as_ref())?;
        }
        Ok(self
            .categories
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
