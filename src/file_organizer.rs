//! Moving files from a source tree into the sorted target layout.
//!
//! The target folder always holds `Unsorted/`, `Files/` and `RAW/`. Dated
//! photos go to `<year>/<Month>/`, created on demand.

use crate::config::CompiledFilters;
use crate::date_resolver::{DateResolver, ResolvedDate};
use crate::file_category::{Category, SKELETON_DIRS};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while organizing files.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Invalid source folder {}: {source}", path.display())]
    InvalidSourcePath { path: PathBuf, source: io::Error },

    #[error("{} has no file name", .0.display())]
    InvalidFileName(PathBuf),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A file found under the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Base name, kept byte for byte at the destination.
    pub name: OsString,
    /// Lowercased extension without the dot, empty if there is none.
    pub extension: String,
}

impl FileRecord {
    pub fn from_path(path: impl Into<PathBuf>) -> OrganizeResult<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .ok_or_else(|| OrganizeError::InvalidFileName(path.clone()))?
            .to_os_string();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            extension,
        })
    }

    /// File name for messages; invalid UTF-8 is replaced.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    pub fn category(&self) -> Category {
        Category::classify(&self.extension)
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Moved,
    /// Dry run: the file would have been moved.
    Planned,
    Failed(String),
}

/// Per-file result of a run.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub record: FileRecord,
    pub category: Category,
    pub date: Option<ResolvedDate>,
    pub destination: PathBuf,
    /// Destination folder relative to the target root, e.g. `2023/May`.
    pub folder: String,
    pub status: FileStatus,
}

/// Result of a whole organizing run.
#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
}

impl OrganizeReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FileStatus::Moved)
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    /// Number of files per destination folder, failures excluded.
    pub fn folder_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if !matches!(outcome.status, FileStatus::Failed(_)) {
                *counts.entry(outcome.folder.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Observer notified as a run progresses.
pub trait ProgressReporter {
    /// Called once, after enumeration, with the number of files to process.
    fn start(&mut self, total: usize);
    /// Called after each file, whether it succeeded or not.
    fn file_done(&mut self, outcome: &FileOutcome);
    fn finish(&mut self);
}

/// Progress reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&mut self, _total: usize) {}
    fn file_done(&mut self, _outcome: &FileOutcome) {}
    fn finish(&mut self) {}
}

fn create_dir(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|source| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates the target root and its fixed folders if they are missing.
///
/// Safe to call on an already organized target.
pub fn ensure_skeleton(target: &Path) -> OrganizeResult<()> {
    create_dir(target)?;
    for dir in SKELETON_DIRS {
        create_dir(&target.join(dir))?;
    }
    Ok(())
}

/// Lists every regular file under `source`, recursively.
///
/// Symbolic links are neither followed nor returned. Anything below `skip`
/// (typically a target folder nested inside the source) is ignored. Entries
/// that cannot be read are logged and skipped.
pub fn enumerate(
    source: &Path,
    filters: &CompiledFilters,
    skip: Option<&Path>,
) -> OrganizeResult<Vec<FileRecord>> {
    let metadata = fs::metadata(source).map_err(|source_error| OrganizeError::InvalidSourcePath {
        path: source.to_path_buf(),
        source: source_error,
    })?;
    if !metadata.is_dir() {
        return Err(OrganizeError::InvalidSourcePath {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let walker = WalkDir::new(source)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| skip.is_none_or(|skip| !entry.path().starts_with(skip)));

    let mut records = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if !filters.should_include(relative) {
            tracing::debug!(path = %entry.path().display(), "excluded by filters");
            continue;
        }

        records.push(FileRecord::from_path(entry.into_path())?);
    }

    Ok(records)
}

/// Computes where a file belongs under `target`.
///
/// Dated photos go to `<year>/<Month>/`; every other file goes to its
/// category's fixed folder. Raw files ignore any date.
pub fn destination_for(
    target: &Path,
    record: &FileRecord,
    category: Category,
    date: Option<&ResolvedDate>,
) -> PathBuf {
    match (category, date) {
        (Category::Photo, Some(date)) => target
            .join(date.year().to_string())
            .join(date.month_name())
            .join(&record.name),
        _ => target.join(category.dir_name()).join(&record.name),
    }
}

/// Moves a file, copying and deleting when a rename cannot cross filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        result => result,
    }
}

/// Moves `record` to `destination`, creating the parent folder first.
///
/// An existing file at `destination` is handled by the platform's rename.
pub fn relocate(record: &FileRecord, destination: &Path) -> OrganizeResult<()> {
    if let Some(parent) = destination.parent() {
        create_dir(parent)?;
    }

    move_file(&record.path, destination).map_err(|source| OrganizeError::FileMoveFailure {
        from: record.path.clone(),
        to: destination.to_path_buf(),
        source,
    })
}

/// Sorts a source tree into a target folder.
pub struct FileOrganizer {
    target: PathBuf,
    resolver: DateResolver,
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Creates an organizer that reads EXIF metadata and accepts every file.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            resolver: DateResolver::default(),
            filters: CompiledFilters::accept_all(),
        }
    }

    pub fn with_resolver(mut self, resolver: DateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Moves every file under `source` into the target layout.
    ///
    /// Directory creation failures abort the run. A file that cannot be moved
    /// is recorded as failed and the run continues with the next one.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ephem::file_organizer::{FileOrganizer, NoProgress};
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new("/photos/sorted");
    /// let report = organizer.organize(Path::new("/photos/inbox"), &mut NoProgress)?;
    /// println!("moved {} of {} files", report.moved_count(), report.total());
    /// # Ok::<(), ephem::file_organizer::OrganizeError>(())
    /// ```
    pub fn organize(
        &self,
        source: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> OrganizeResult<OrganizeReport> {
        ensure_skeleton(&self.target)?;
        self.run(source, progress, false)
    }

    /// Works out where every file would go without touching the filesystem.
    pub fn plan(
        &self,
        source: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> OrganizeResult<OrganizeReport> {
        self.run(source, progress, true)
    }

    fn run(
        &self,
        source: &Path,
        progress: &mut dyn ProgressReporter,
        dry_run: bool,
    ) -> OrganizeResult<OrganizeReport> {
        let source = fs::canonicalize(source).map_err(|e| OrganizeError::InvalidSourcePath {
            path: source.to_path_buf(),
            source: e,
        })?;
        // Only a target strictly below the source is left out of the walk.
        // Sorting in place (or from a folder below the target) walks everything,
        // and already placed files are renamed onto themselves.
        let skip = fs::canonicalize(&self.target)
            .ok()
            .filter(|target| *target != source && target.starts_with(&source));

        let records = enumerate(&source, &self.filters, skip.as_deref())?;
        tracing::info!(source = %source.display(), files = records.len(), dry_run, "organizing");

        let mut report = OrganizeReport {
            dry_run,
            outcomes: Vec::with_capacity(records.len()),
        };
        progress.start(records.len());

        for record in records {
            let category = record.category();
            let date = self.resolver.resolve(&record.path);
            let destination = destination_for(&self.target, &record, category, date.as_ref());
            tracing::debug!(
                file = %record.display_name(),
                ?category,
                dated = date.is_some(),
                destination = %destination.display(),
                "placed"
            );

            let status = if dry_run {
                FileStatus::Planned
            } else {
                match relocate(&record, &destination) {
                    Ok(()) => {
                        tracing::info!(from = %record.path.display(), to = %destination.display(), "moved");
                        FileStatus::Moved
                    }
                    Err(e @ OrganizeError::DirectoryCreationFailed { .. }) => {
                        progress.finish();
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "move failed");
                        FileStatus::Failed(e.to_string())
                    }
                }
            };

            let folder = destination
                .parent()
                .and_then(|parent| parent.strip_prefix(&self.target).ok())
                .map(|folder| folder.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();

            let outcome = FileOutcome {
                record,
                category,
                date,
                destination,
                folder,
                status,
            };
            progress.file_done(&outcome);
            report.outcomes.push(outcome);
        }

        progress.finish();
        Ok(report)
    }
}
