//! Global constants for the diagnostic collector.
//!
//! This module centralizes hardcoded values so the defaults used by the
//! configuration, the collectors and the archiver live in one place.

// Exclusion policy
/// File name suffixes that are never collected. Matched case-insensitively
/// against the end of the full path. `cab` intentionally has no leading dot.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] =
    &[".dll", ".exe", ".bin", ".msi", ".dat", ".rar", ".gz", "cab"];

/// Default size ceiling for collected files (8MB)
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 8;

/// Bytes per megabyte used when converting configured limits
pub const BYTES_PER_MB: u64 = 1024 * 1024;

// Archive constants
/// Prefix of the generated archive file name
pub const DEFAULT_ARCHIVE_PREFIX: &str = "N-Able_Logs";

/// Archive file extension
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Deflate level used for every archive entry
pub const ARCHIVE_COMPRESSION_LEVEL: i32 = 6;

/// Timestamp format used in archive and event log file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Archive root used when the hostname cannot be determined
pub const UNKNOWN_HOSTNAME: &str = "unknown-host";

// Staging layout
/// Subdirectory of a category that receives exporter output
pub const EVENT_LOGS_DIR: &str = "EventLogs";

/// Prefix of the per-run staging directory
pub const STAGING_DIR_PREFIX: &str = "diag-staging-";

/// First segment for paths under a Unix filesystem root, alongside the
/// drive letters and `UNC` used for Windows paths
pub const FILESYSTEM_ROOT_DIR: &str = "root";

/// Prefix of per-category scratch directories
pub const SCRATCH_DIR_PREFIX: &str = "diag-scratch-";

// Event log export
/// External utility used to export event log channels
pub const DEFAULT_EVENT_LOG_UTILITY: &str = "wevtutil";

/// Argument template for the export utility
pub const DEFAULT_EVENT_LOG_ARGS: &[&str] = &["epl", "{channel}", "{output}"];

/// Event log channels exported by default
pub const DEFAULT_EVENT_LOG_CHANNELS: &[&str] = &["Application", "System", "Security"];

/// File extension of exported event logs
pub const DEFAULT_EVENT_LOG_EXTENSION: &str = "evtx";

/// Upper bound on a single channel export in seconds
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 300;

/// Poll interval while waiting on the export utility in milliseconds
pub const EXPORT_POLL_INTERVAL_MS: u64 = 100;

// Destination directories
/// Preferred archive destination for unattended runs on Windows
pub const WINDOWS_PRIMARY_DESTINATION: &str = r"C:\Windows\Temp";

/// Fallback archive destination on Windows
pub const WINDOWS_FALLBACK_DESTINATION: &str = r"C:\Temp";

// Exit codes
/// Archive created
pub const EXIT_ARCHIVE_CREATED: u8 = 0;

/// Content was collected but the archive could not be written
pub const EXIT_ARCHIVE_FAILED: u8 = 1;

/// Nothing eligible was found
pub const EXIT_NOTHING_COLLECTED: u8 = 2;

/// Run stopped by the user
pub const EXIT_CANCELLED: u8 = 130;

// Concurrency
/// Hard cap on collection worker threads
pub const MAX_COLLECTION_THREADS: usize = 32;

/// Capacity of the progress channel between the worker thread and its observer
pub const PROGRESS_CHANNEL_CAPACITY: usize = 256;
