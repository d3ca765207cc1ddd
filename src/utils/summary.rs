use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::models::CollectionSummary;

/// Create a JSON summary of the collection.
///
/// # Example Output
///
/// ```json
/// {
///   "collection_id": "550e8400-e29b-41d4-a716-446655440000",
///   "hostname": "HOST01",
///   "collection_time": "2024-01-15T14:30:52+00:00",
///   "archive": "C:\\Windows\\Temp\\N-Able_Logs_HOST01_20240115_143052.zip",
///   "files_copied": 42,
///   "categories": [...]
/// }
/// ```
pub fn create_collection_summary(
    hostname: &str,
    timestamp: &str,
    summary: &CollectionSummary,
    archive: Option<&Path>,
) -> Result<String> {
    let report = json!({
        "collection_id": Uuid::new_v4().to_string(),
        "hostname": hostname,
        "collection_time": timestamp,
        "os": std::env::consts::OS,
        "collector_version": env!("CARGO_PKG_VERSION"),
        "archive": archive.map(|p| p.to_string_lossy().to_string()),
        "produced_output": summary.produced_output,
        "cancelled": summary.cancelled,
        "files_copied": summary.files_copied(),
        "failure_count": summary.failure_count(),
        "categories": summary.categories,
    });

    serde_json::to_string_pretty(&report).context("Failed to serialize collection summary to JSON")
}

/// Path of the summary file written beside an archive (`<stem>.json`).
pub fn summary_path_for(archive: &Path) -> PathBuf {
    archive.with_extension("json")
}

/// Write `json` beside `archive` and return the summary file path.
pub fn write_summary_file(archive: &Path, json: &str) -> Result<PathBuf> {
    let path = summary_path_for(archive);
    fs::write(&path, json).context(format!("Failed to write summary to {}", path.display()))?;
    info!("Wrote collection summary to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryReport;
    use serde_json::Value;
    use tempfile::TempDir;

    fn summary() -> CollectionSummary {
        let mut report = CategoryReport::new("MSP Core");
        report.produced_output = true;
        report.files_copied = 3;
        report.bytes_copied = 120;
        CollectionSummary {
            produced_output: true,
            cancelled: false,
            categories: vec![report, CategoryReport::new("Take Control Viewer")],
        }
    }

    #[test]
    fn test_basic_summary_creation() {
        let json_str =
            create_collection_summary("test-host", "2024-01-01T00:00:00Z", &summary(), None).unwrap();
        let json: Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(json["hostname"], "test-host");
        assert_eq!(json["collection_time"], "2024-01-01T00:00:00Z");
        assert!(json["collection_id"].is_string());
        assert!(json["collector_version"].is_string());
        assert!(json["archive"].is_null());
        assert_eq!(json["files_copied"], 3);
        assert_eq!(json["categories"].as_array().unwrap().len(), 2);
        assert_eq!(json["categories"][0]["name"], "MSP Core");
        assert_eq!(json["categories"][1]["produced_output"], false);
    }

    #[test]
    fn test_unique_collection_ids() {
        let a = create_collection_summary("h", "t", &summary(), None).unwrap();
        let b = create_collection_summary("h", "t", &summary(), None).unwrap();
        let a: Value = serde_json::from_str(&a).unwrap();
        let b: Value = serde_json::from_str(&b).unwrap();
        assert_ne!(a["collection_id"], b["collection_id"]);
    }

    #[test]
    fn test_write_summary_beside_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("N-Able_Logs_h_20240101_000000.zip");
        let json = create_collection_summary("h", "t", &summary(), Some(&archive)).unwrap();

        let path = write_summary_file(&archive, &json).unwrap();
        assert_eq!(path, dir.path().join("N-Able_Logs_h_20240101_000000.json"));
        let value: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["archive"], archive.to_string_lossy().to_string());
    }
}
