use std::fs;
use std::path::{Component, Path, PathBuf, Prefix};

use log::{debug, info, warn};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::{resolve_source_path, Category, ExclusionPolicy, Exporter, SourceEntry};
use crate::constants::{EVENT_LOGS_DIR, FILESYSTEM_ROOT_DIR, SCRATCH_DIR_PREFIX};
use crate::error::CollectError;
use crate::models::{CategoryReport, EntryFailure};

/// Map an absolute source path to its location inside a category subtree.
///
/// The drive or volume is kept as the first segment (`C:\x\a.log` becomes
/// `C/x/a.log`, `\\srv\share\a.log` becomes `UNC/srv/share/a.log`) so two
/// distinct absolute paths never map to the same destination. A Unix root
/// becomes `root`, keeping path sources apart from exporter output.
pub fn staging_relative_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut rel = PathBuf::new();
    let mut depth = 0usize;
    let mut floor = 0usize;

    for component in absolute.components() {
        match component {
            Component::Prefix(prefix) => {
                let segments: Vec<String> = match prefix.kind() {
                    Prefix::Disk(d) | Prefix::VerbatimDisk(d) => {
                        vec![(d as char).to_ascii_uppercase().to_string()]
                    }
                    Prefix::UNC(server, share) | Prefix::VerbatimUNC(server, share) => vec![
                        "UNC".to_string(),
                        server.to_string_lossy().to_string(),
                        share.to_string_lossy().to_string(),
                    ],
                    Prefix::Verbatim(name) => vec![name.to_string_lossy().to_string()],
                    Prefix::DeviceNS(name) => {
                        vec!["Device".to_string(), name.to_string_lossy().to_string()]
                    }
                };
                for segment in segments {
                    rel.push(segment);
                    depth += 1;
                }
                floor = depth;
            }
            Component::RootDir => {
                if depth == 0 {
                    rel.push(FILESYSTEM_ROOT_DIR);
                    depth = 1;
                    floor = 1;
                }
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > floor {
                    rel.pop();
                    depth -= 1;
                }
            }
            Component::Normal(part) => {
                rel.push(part);
                depth += 1;
            }
        }
    }

    rel
}

/// True if any regular file exists below `dir`.
pub fn dir_has_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file())
}

/// Move every file below `src` to the same relative location below `dst`.
///
/// Falls back to copy-and-delete when a rename crosses filesystems.
/// Returns the number of files and bytes moved.
pub fn move_tree(src: &Path, dst: &Path) -> Result<(usize, u64), CollectError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let mut moved = 0usize;
    let mut bytes = 0u64;
    for file in files {
        let rel = file.strip_prefix(src).unwrap_or(&file);
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| CollectError::from_io(parent, e))?;
        }

        let size = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
        if fs::rename(&file, &target).is_err() {
            fs::copy(&file, &target).map_err(|e| CollectError::from_io(&file, e))?;
            if let Err(e) = fs::remove_file(&file) {
                debug!("Could not remove {} after copy: {}", file.display(), e);
            }
        }
        moved += 1;
        bytes += size;
    }

    Ok((moved, bytes))
}

/// Copies the sources of one category into the staging root.
pub struct StagingCollector<'a> {
    category: &'a Category,
    policy: ExclusionPolicy,
    scratch_parent: Option<PathBuf>,
    report: CategoryReport,
}

impl<'a> StagingCollector<'a> {
    pub fn new(category: &'a Category, policy: &ExclusionPolicy) -> Self {
        let policy = if category.size_limited {
            policy.clone()
        } else {
            policy.without_size_limit()
        };

        StagingCollector {
            category,
            policy,
            scratch_parent: None,
            report: CategoryReport::new(category.name.clone()),
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    pub fn with_scratch_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }

    fn scratch_dir(&self) -> Result<TempDir, CollectError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_DIR_PREFIX);
        match &self.scratch_parent {
            Some(parent) => builder
                .tempdir_in(parent)
                .map_err(|e| CollectError::from_io(parent, e)),
            None => builder
                .tempdir()
                .map_err(|e| CollectError::from_io(std::env::temp_dir(), e)),
        }
    }

    /// Collect every source entry and place the result under
    /// `staging_root/<category>`.
    pub fn collect(mut self, staging_root: &Path) -> CategoryReport {
        let scratch = match self.scratch_dir() {
            Ok(dir) => dir,
            Err(err) => {
                warn!("Cannot create scratch directory for {}: {}", self.category.name, err);
                self.report.failures.push(EntryFailure::new(self.category.name.clone(), &err));
                return self.report;
            }
        };

        let category = self.category;
        for source in &category.sources {
            let result = match source {
                SourceEntry::Path(raw) => self.collect_path(raw, scratch.path()),
                SourceEntry::Exporter(exporter) => {
                    self.collect_export(exporter.as_ref(), scratch.path())
                }
            };

            if let Err(e) = result {
                warn!("Could not collect {} for {}: {}", source.label(), self.category.name, e);
                self.record(source.label(), &e);
            }
        }

        if self.report.files_copied > 0 {
            let final_dir = staging_root.join(self.category.staging_dir_name());
            match move_tree(scratch.path(), &final_dir) {
                Ok(_) => self.report.produced_output = true,
                Err(e) => {
                    warn!("Failed to stage {}: {}", self.category.name, e);
                    self.record(final_dir.to_string_lossy().to_string(), &e);
                    self.report.produced_output = dir_has_files(&final_dir);
                }
            }
        }

        if let Err(e) = scratch.close() {
            debug!("Failed to remove scratch directory for {}: {}", self.category.name, e);
        }

        info!(
            "Category {}: {} file(s), {} bytes, {} excluded, {} failure(s)",
            self.category.name,
            self.report.files_copied,
            self.report.bytes_copied,
            self.report.skipped_excluded,
            self.report.failures.len()
        );
        self.report
    }

    fn record(&mut self, source: String, error: &CollectError) {
        self.report.failures.push(EntryFailure::new(source, error));
    }

    fn collect_path(&mut self, raw: &str, scratch: &Path) -> Result<(), CollectError> {
        let path = resolve_source_path(raw);
        let metadata = fs::metadata(&path).map_err(|e| CollectError::from_io(&path, e))?;

        if metadata.is_dir() {
            self.collect_directory(&path, scratch);
            return Ok(());
        }

        if self.policy.should_exclude(&path, metadata.len()) {
            debug!("Skipping excluded file: {}", path.display());
            self.report.skipped_excluded += 1;
            return Ok(());
        }
        self.copy_file(&path, scratch)
    }

    /// Walk a directory; failures on individual files are recorded and skipped.
    fn collect_directory(&mut self, dir: &Path, scratch: &Path) {
        debug!("Collecting directory {}", dir.display());

        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let source = e
                        .path()
                        .unwrap_or(dir)
                        .to_string_lossy()
                        .to_string();
                    let err = CollectError::from(e);
                    warn!("Skipping {}: {}", source, err);
                    self.record(source, &err);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let metadata = match fs::metadata(path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    let err = CollectError::from_io(path, e);
                    warn!("Skipping {}: {}", path.display(), err);
                    self.record(path.to_string_lossy().to_string(), &err);
                    continue;
                }
            };

            if self.policy.should_exclude(path, metadata.len()) {
                debug!("Skipping excluded file: {}", path.display());
                self.report.skipped_excluded += 1;
                continue;
            }

            if let Err(err) = self.copy_file(path, scratch) {
                warn!("Skipping {}: {}", path.display(), err);
                self.record(path.to_string_lossy().to_string(), &err);
            }
        }
    }

    fn copy_file(&mut self, source: &Path, scratch: &Path) -> Result<(), CollectError> {
        let dest = scratch.join(staging_relative_path(source));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| CollectError::from_io(parent, e))?;
        }

        let bytes = fs::copy(source, &dest).map_err(|e| CollectError::from_io(source, e))?;
        debug!("Copied {} ({} bytes)", source.display(), bytes);
        self.report.files_copied += 1;
        self.report.bytes_copied += bytes;
        Ok(())
    }

    fn collect_export(&mut self, exporter: &dyn Exporter, scratch: &Path) -> Result<(), CollectError> {
        let private = self.scratch_dir()?;

        let result_dir = exporter
            .export(private.path())
            .map_err(|e| CollectError::Export {
                name: exporter.name().to_string(),
                message: format!("{:#}", e),
            })?;

        if !result_dir.is_dir() || !dir_has_files(&result_dir) {
            info!("Exporter {} produced no output", exporter.name());
            return Ok(());
        }

        let (files, bytes) = move_tree(&result_dir, &scratch.join(EVENT_LOGS_DIR))?;
        self.report.files_copied += files;
        self.report.bytes_copied += bytes;

        if let Err(e) = private.close() {
            debug!("Failed to remove exporter scratch directory: {}", e);
        }
        Ok(())
    }
}

/// Collect one category into `staging_root`.
pub fn collect_category(
    category: &Category,
    staging_root: &Path,
    policy: &ExclusionPolicy,
) -> CategoryReport {
    StagingCollector::new(category, policy).collect(staging_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::test_utils::{create_test_file_structure, list_files, FailingExporter, StaticExporter};

    fn path_entry(p: &Path) -> SourceEntry {
        SourceEntry::path(p.to_string_lossy().to_string())
    }

    #[cfg(unix)]
    #[test]
    fn test_staging_relative_path_unix() {
        assert_eq!(
            staging_relative_path(Path::new("/x/report.log")),
            PathBuf::from("root/x/report.log")
        );
        assert_eq!(
            staging_relative_path(Path::new("/x/../y/./a.log")),
            PathBuf::from("root/y/a.log")
        );
        assert_eq!(staging_relative_path(Path::new("/../a")), PathBuf::from("root/a"));
    }

    #[cfg(windows)]
    #[test]
    fn test_staging_relative_path_windows() {
        assert_eq!(
            staging_relative_path(Path::new(r"C:\ProgramData\App\log.txt")),
            PathBuf::from(r"C\ProgramData\App\log.txt")
        );
        assert_eq!(
            staging_relative_path(Path::new(r"\\srv\share\a.log")),
            PathBuf::from(r"UNC\srv\share\a.log")
        );
        assert_ne!(
            staging_relative_path(Path::new(r"C:\x\a.log")),
            staging_relative_path(Path::new(r"D:\x\a.log"))
        );
    }

    #[test]
    fn test_collect_single_file_and_exclusion() {
        let src = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        fs::write(src.path().join("report.log"), b"report").unwrap();
        fs::write(src.path().join("app.bin"), b"binary").unwrap();

        let category = Category::new(
            "A",
            vec![
                path_entry(&src.path().join("report.log")),
                path_entry(&src.path().join("app.bin")),
            ],
        );
        let policy = ExclusionPolicy::new([".bin"], None);
        let report = collect_category(&category, staging.path(), &policy);

        assert!(report.produced_output);
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.skipped_excluded, 1);

        let files = list_files(staging.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("report.log"));
        assert!(files[0].starts_with(Path::new("A")));
    }

    #[test]
    fn test_collect_directory_recursive_exclusion() {
        let src = create_test_file_structure().unwrap();
        fs::write(src.path().join("dir1/subdir1/deep.DLL"), b"x").unwrap();
        fs::write(src.path().join("dir2/bundle.cab"), b"x").unwrap();
        let staging = TempDir::new().unwrap();

        let category = Category::new("Logs", vec![path_entry(src.path())]);
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());

        assert!(report.produced_output);
        assert_eq!(report.files_copied, 5);
        assert_eq!(report.skipped_excluded, 2);

        let files = list_files(staging.path());
        assert!(files.iter().all(|f| {
            let s = f.to_string_lossy().to_lowercase();
            !s.ends_with(".dll") && !s.ends_with("cab")
        }));

        let expected = staging
            .path()
            .join("Logs")
            .join(staging_relative_path(&src.path().join("dir1/subdir1/file4.txt")));
        assert_eq!(fs::read(expected).unwrap(), b"Test content 4");
    }

    #[test]
    fn test_size_limit_respects_category_flag() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("big.log"), vec![b'x'; 2048]).unwrap();
        fs::write(src.path().join("small.log"), b"small").unwrap();
        let policy = ExclusionPolicy::new([".bin"], Some(1024));

        let staging = TempDir::new().unwrap();
        let limited = Category::new("Limited", vec![path_entry(src.path())]);
        let report = collect_category(&limited, staging.path(), &policy);
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.skipped_excluded, 1);

        let unlimited = Category::new("Unlimited", vec![path_entry(src.path())]).with_size_limit(false);
        let report = collect_category(&unlimited, staging.path(), &policy);
        assert_eq!(report.files_copied, 2);
    }

    #[test]
    fn test_same_name_different_dirs_do_not_collide() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a")).unwrap();
        fs::create_dir_all(src.path().join("b")).unwrap();
        fs::write(src.path().join("a/log.txt"), b"from a").unwrap();
        fs::write(src.path().join("b/log.txt"), b"from b").unwrap();
        let staging = TempDir::new().unwrap();

        let category = Category::new(
            "Dup",
            vec![
                path_entry(&src.path().join("a/log.txt")),
                path_entry(&src.path().join("b/log.txt")),
            ],
        );
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());
        assert_eq!(report.files_copied, 2);

        let root = staging.path().join("Dup");
        let a = root.join(staging_relative_path(&src.path().join("a/log.txt")));
        let b = root.join(staging_relative_path(&src.path().join("b/log.txt")));
        assert_eq!(fs::read(a).unwrap(), b"from a");
        assert_eq!(fs::read(b).unwrap(), b"from b");
    }

    #[test]
    fn test_missing_path_is_recorded_not_fatal() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("ok.log"), b"ok").unwrap();
        let staging = TempDir::new().unwrap();

        let category = Category::new(
            "Mixed",
            vec![
                path_entry(&src.path().join("missing")),
                path_entry(&src.path().join("ok.log")),
            ],
        );
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());
        assert!(report.produced_output);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::NotFound);
    }

    #[test]
    fn test_nothing_collected_leaves_no_category_dir() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("only.exe"), b"x").unwrap();
        let staging = TempDir::new().unwrap();

        let category = Category::new("Empty", vec![path_entry(src.path())]);
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());
        assert!(!report.produced_output);
        assert!(!staging.path().join("Empty").exists());
    }

    #[test]
    fn test_exporter_output_lands_under_event_logs() {
        let staging = TempDir::new().unwrap();
        let category = Category::new(
            "Events",
            vec![SourceEntry::exporter(StaticExporter::new(&["System.evtx", "Application.evtx"]))],
        );
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());

        assert!(report.produced_output);
        assert_eq!(report.files_copied, 2);
        let dir = staging.path().join("Events").join(EVENT_LOGS_DIR);
        assert!(dir.join("System.evtx").is_file());
        assert!(dir.join("Application.evtx").is_file());
    }

    #[test]
    fn test_empty_exporter_is_not_output() {
        let staging = TempDir::new().unwrap();
        let category = Category::new("Events", vec![SourceEntry::exporter(StaticExporter::new(&[]))]);
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());
        assert!(!report.produced_output);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_failing_exporter_is_recorded() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("app.log"), b"log").unwrap();
        let staging = TempDir::new().unwrap();
        let category = Category::new(
            "Events",
            vec![SourceEntry::exporter(FailingExporter), path_entry(&src.path().join("app.log"))],
        );

        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());
        assert!(report.produced_output);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Export);
        assert_eq!(report.failures[0].source, "<failing>");
    }

    #[test]
    fn test_move_tree() {
        let src = create_test_file_structure().unwrap();
        let dst = TempDir::new().unwrap();
        let (files, bytes) = move_tree(src.path(), &dst.path().join("out")).unwrap();
        assert_eq!(files, 5);
        assert!(bytes > 0);
        assert!(!dir_has_files(src.path()));
        assert_eq!(
            fs::read(dst.path().join("out/dir1/subdir1/file4.txt")).unwrap(),
            b"Test content 4"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_root_event_logs_path_does_not_meet_exporter_output() {
        assert_eq!(
            staging_relative_path(Path::new("/EventLogs/System.evtx")),
            PathBuf::from("root/EventLogs/System.evtx")
        );
        assert_ne!(
            staging_relative_path(Path::new("/EventLogs/System.evtx")),
            Path::new(EVENT_LOGS_DIR).join("System.evtx")
        );
    }

    #[test]
    fn test_scratch_removed_after_success() {
        let src = create_test_file_structure().unwrap();
        let scratch = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let category = Category::new(
            "Mixed",
            vec![
                path_entry(src.path()),
                SourceEntry::exporter(StaticExporter::new(&["System.evtx"])),
            ],
        );

        let report = StagingCollector::new(&category, &ExclusionPolicy::default())
            .with_scratch_parent(scratch.path())
            .collect(staging.path());
        assert!(report.produced_output);
        assert_eq!(report.files_copied, 6);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_removed_after_empty_export() {
        let scratch = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let category = Category::new("Events", vec![SourceEntry::exporter(StaticExporter::new(&[]))]);

        let report = StagingCollector::new(&category, &ExclusionPolicy::default())
            .with_scratch_parent(scratch.path())
            .collect(staging.path());
        assert!(!report.produced_output);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_removed_after_failed_export() {
        let scratch = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let category = Category::new("Events", vec![SourceEntry::exporter(FailingExporter)]);

        let report = StagingCollector::new(&category, &ExclusionPolicy::default())
            .with_scratch_parent(scratch.path())
            .collect(staging.path());
        assert!(!report.produced_output);
        assert_eq!(report.failures[0].kind, FailureKind::Export);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_scratch_parent_is_recorded() {
        let staging = TempDir::new().unwrap();
        let category = Category::new("Events", vec![SourceEntry::exporter(StaticExporter::new(&["a.evtx"]))]);

        let report = StagingCollector::new(&category, &ExclusionPolicy::default())
            .with_scratch_parent(staging.path().join("absent"))
            .collect(staging.path());
        assert!(!report.produced_output);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_followed() {
        use std::os::unix::fs::symlink;

        let src = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("real")).unwrap();
        fs::write(src.path().join("real/a.log"), b"a").unwrap();
        fs::write(other.path().join("b.log"), b"b").unwrap();
        symlink(other.path(), src.path().join("linked")).unwrap();
        symlink(src.path(), src.path().join("real/loop")).unwrap();
        let staging = TempDir::new().unwrap();

        let category = Category::new("Linked", vec![path_entry(src.path())]);
        let report = collect_category(&category, staging.path(), &ExclusionPolicy::default());

        assert_eq!(report.files_copied, 2);
        let linked = staging
            .path()
            .join("Linked")
            .join(staging_relative_path(&src.path().join("linked/b.log")));
        assert_eq!(fs::read(linked).unwrap(), b"b");
        // The loop back to the source root is reported, not walked forever
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Io);
    }
}
