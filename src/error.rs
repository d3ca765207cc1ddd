//! Error kinds that callers and tests need to tell apart.
//!
//! Plumbing errors (directory creation, archive writing) travel as
//! `anyhow::Error`; the enums here carry the distinctions that show up in
//! collection reports and in the session outcome.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while collecting one source entry of a category.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("exporter {name} failed: {message}")]
    Export { name: String, message: String },
}

impl CollectError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => CollectError::NotFound(path),
            io::ErrorKind::PermissionDenied => CollectError::PermissionDenied(path),
            _ => CollectError::Io { path, source },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CollectError::NotFound(_) => FailureKind::NotFound,
            CollectError::PermissionDenied(_) => FailureKind::PermissionDenied,
            CollectError::Io { .. } => FailureKind::Io,
            CollectError::Export { .. } => FailureKind::Export,
        }
    }
}

impl From<walkdir::Error> for CollectError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        match err.into_io_error() {
            Some(io_err) => CollectError::from_io(path, io_err),
            None => CollectError::Io {
                path,
                source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
            },
        }
    }
}

/// Serializable classification of a [`CollectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Io,
    Export,
}

/// Lookup failure in the category registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    #[error("categories {first:?} and {second:?} would share staging directory {dir:?}")]
    StagingDirClash {
        first: String,
        second: String,
        dir: String,
    },
}

/// Failure to start a collection session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a collection run is already in progress")]
    AlreadyRunning,
}
