use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info};
use walkdir::WalkDir;
use zip::{write::FileOptions, ZipWriter};

use crate::config::ExclusionPolicy;
use crate::constants::{ARCHIVE_COMPRESSION_LEVEL, ARCHIVE_EXTENSION};

/// Result of a successful call to [`create_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Created(PathBuf),
    /// The staging tree held nothing eligible; no file was written.
    NothingToArchive,
}

/// Archive file name, e.g. `N-Able_Logs_HOST01_20240115_143052.zip`.
pub fn archive_name(prefix: &str, hostname: &str, timestamp: &str) -> String {
    format!("{}_{}_{}.{}", prefix, hostname, timestamp, ARCHIVE_EXTENSION)
}

/// Fixed compression policy for every entry.
pub fn archive_options() -> FileOptions {
    FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(ARCHIVE_COMPRESSION_LEVEL))
        .unix_permissions(0o644)
}

/// True if `root` holds at least one file whose name is not excluded.
///
/// Only the name rule applies here; size was already enforced at copy time.
pub fn has_eligible_content(root: &Path, policy: &ExclusionPolicy) -> bool {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .any(|e| !policy.is_excluded_name(e.path()))
}

/// Entry name inside the archive: `/`-separated, under `root_name`.
fn entry_name(root_name: &str, rel: &Path) -> String {
    let mut name = root_name.to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

/// Write the staging tree into a single archive at `destination`.
///
/// Entries are rooted at `hostname/`. The archive is built in a temporary
/// file beside `destination` and only renamed into place once complete, so
/// a failure never leaves a partial archive behind.
pub fn create_archive(
    staging_root: &Path,
    destination: &Path,
    policy: &ExclusionPolicy,
    hostname: &str,
) -> Result<ArchiveOutcome> {
    if !has_eligible_content(staging_root, policy) {
        info!("Nothing eligible to archive in {}", staging_root.display());
        return Ok(ArchiveOutcome::NothingToArchive);
    }

    let start = Instant::now();
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".diag-archive-")
        .suffix(".part")
        .tempfile_in(parent)
        .context(format!("Failed to create temporary archive in {}", parent.display()))?;

    let mut zip = ZipWriter::new(temp);
    let options = archive_options();
    let mut file_count = 0usize;

    zip.add_directory(format!("{}/", hostname), options)
        .context("Failed to add archive root")?;

    for entry in WalkDir::new(staging_root).min_depth(1).sort_by_file_name() {
        let entry = entry.context("Failed to walk staging directory")?;
        let rel = entry.path().strip_prefix(staging_root).unwrap_or(entry.path());
        let name = entry_name(hostname, rel);

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .context(format!("Failed to add directory entry {}", name))?;
            continue;
        }

        let mut file = fs::File::open(entry.path())
            .context(format!("Failed to open {}", entry.path().display()))?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        zip.start_file(name.clone(), options.large_file(size >= u32::MAX as u64))
            .context(format!("Failed to start file entry for {}", name))?;
        io::copy(&mut file, &mut zip)
            .context(format!("Failed to write {} to archive", name))?;
        file_count += 1;
        debug!("Archived {} ({} bytes)", name, size);
    }

    let temp = zip.finish().context("Failed to finalize archive")?;
    let written = temp
        .as_file()
        .metadata()
        .context("Failed to stat temporary archive")?
        .len();
    if written == 0 {
        anyhow::bail!("Archive for {} is empty", destination.display());
    }

    temp.persist(destination)
        .map_err(|e| e.error)
        .context(format!("Failed to move archive to {}", destination.display()))?;

    info!(
        "Archived {} file(s) to {} ({} bytes) in {:?}",
        file_count,
        destination.display(),
        written,
        start.elapsed()
    );
    Ok(ArchiveOutcome::Created(destination.to_path_buf()))
}

/// [`create_archive`] reduced to "was an archive written".
pub fn archive(
    staging_root: &Path,
    destination: &Path,
    policy: &ExclusionPolicy,
    hostname: &str,
) -> bool {
    match create_archive(staging_root, destination, policy, hostname) {
        Ok(ArchiveOutcome::Created(_)) => true,
        Ok(ArchiveOutcome::NothingToArchive) => false,
        Err(e) => {
            error!("Failed to create archive {}: {:#}", destination.display(), e);
            false
        }
    }
}
