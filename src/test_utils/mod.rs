//! Test utilities for diag_collector
//!
//! Shared fixtures for the unit test modules.

#![cfg(test)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::Exporter;
use crate::constants::EVENT_LOGS_DIR;

/// Creates a temporary directory that is automatically cleaned up
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file structure in a temporary directory
pub fn create_test_file_structure() -> Result<TempDir> {
    let temp_dir = create_temp_dir()?;
    let base_path = temp_dir.path();

    fs::create_dir_all(base_path.join("dir1/subdir1"))?;
    fs::create_dir_all(base_path.join("dir2"))?;

    fs::write(base_path.join("file1.txt"), b"Test content 1")?;
    fs::write(base_path.join("file2.log"), b"Test log content")?;
    fs::write(base_path.join("dir1/file3.txt"), b"Test content 3")?;
    fs::write(base_path.join("dir1/subdir1/file4.txt"), b"Test content 4")?;
    fs::write(base_path.join("dir2/file5.log"), b"Another log file")?;

    Ok(temp_dir)
}

/// Every regular file below `root`, relative to it, sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(|p| p.to_path_buf()))
        .collect();
    files.sort();
    files
}

/// Exporter that writes a fixed set of files.
#[derive(Debug)]
pub struct StaticExporter {
    files: Vec<String>,
}

impl StaticExporter {
    pub fn new(files: &[&str]) -> Self {
        StaticExporter {
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Exporter for StaticExporter {
    fn name(&self) -> &str {
        "static"
    }

    fn export(&self, output_dir: &Path) -> Result<PathBuf> {
        let dir = output_dir.join(EVENT_LOGS_DIR);
        fs::create_dir_all(&dir)?;
        for file in &self.files {
            fs::write(dir.join(file), format!("exported {}", file))?;
        }
        Ok(dir)
    }
}

/// Exporter that always fails.
#[derive(Debug)]
pub struct FailingExporter;

impl Exporter for FailingExporter {
    fn name(&self) -> &str {
        "failing"
    }

    fn export(&self, _output_dir: &Path) -> Result<PathBuf> {
        anyhow::bail!("export service unavailable")
    }
}

/// Write a shell script standing in for the event log utility.
///
/// Returns the program and argument template to hand to the exporter.
/// Channel behaviour: `Security` fails, `Partial` writes then fails,
/// `Silent` succeeds without writing, `Hang` never finishes, anything
/// else is exported.
#[cfg(unix)]
pub fn fake_export_utility(dir: &Path) -> Result<(String, Vec<String>)> {
    let script = dir.join("fake_export.sh");
    fs::write(
        &script,
        r#"# usage: fake_export.sh epl <channel> <output>
case "$2" in
  Security) exit 5 ;;
  Partial) printf 'partial' > "$3"; exit 1 ;;
  Silent) exit 0 ;;
  Hang) exec sleep 30 ;;
  *) printf 'exported %s\n' "$2" > "$3" ;;
esac
"#,
    )?;

    Ok((
        "sh".to_string(),
        vec![
            script.to_string_lossy().to_string(),
            "epl".to_string(),
            "{channel}".to_string(),
            "{output}".to_string(),
        ],
    ))
}
