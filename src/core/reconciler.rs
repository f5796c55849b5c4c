//! Converging on-disk placeholder folders with the classified movie set.
//!
//! Two operations:
//! - `ensure_placeholder`: create the folder + video for one movie if missing
//! - `reconcile_all`: scan the library directories the catalog knows about
//!   and remove placeholder folders that are no longer wanted
//!
//! Only folders whose name carries [`PLACEHOLDER_MARKER`] are ever touched,
//! and only inside directories derived from catalog paths. There is no
//! recursive walk from a root.
//!
//! Failures are per item: they are returned or collected, never raised past
//! the current movie/folder.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::domain::{CatalogEntry, ClassifiedMovie};

use super::paths::{
    library_dir, placeholder_dir, placeholder_file_stem, title_from_folder, PathMapper,
    PLACEHOLDER_MARKER,
};
use super::payload::PayloadAsset;

/// Per-item placeholder failures
#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error("No storage path for {title}")]
    MissingPath { title: String },

    #[error("Failed to create placeholder folder for {title} at {}: {source}", .path.display())]
    CreateDir {
        title: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to copy placeholder video for {title} to {}: {source}", .path.display())]
    CopyPayload {
        title: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to scan {}: {source}", .path.display())]
    ScanDir { path: PathBuf, source: io::Error },

    #[error("Failed to remove placeholder for {title} at {}: {source}", .path.display())]
    Remove {
        title: String,
        path: PathBuf,
        source: io::Error,
    },
}

/// Successful result of `ensure_placeholder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Folder and video were created
    Created { file: PathBuf, bytes: u64 },

    /// Folder was already there; nothing done
    AlreadyPresent { folder: PathBuf },
}

/// Why a placeholder folder was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The real movie file is now present
    Downloaded,

    /// Still in the catalog but no longer upcoming/released-pending
    NoLongerMeetsCriteria,

    /// No catalog entry maps to this folder anymore
    NotInCatalog,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalReason::Downloaded => write!(f, "movie has been downloaded"),
            RemovalReason::NoLongerMeetsCriteria => write!(f, "movie no longer meets criteria"),
            RemovalReason::NotInCatalog => write!(f, "movie no longer exists in the catalog"),
        }
    }
}

/// Decide whether a placeholder folder should go.
///
/// `entry` is the catalog entry whose derived placeholder path equals the
/// folder, `desired` whether the folder is in this run's desired set.
pub fn removal_reason(entry: Option<&CatalogEntry>, desired: bool) -> Option<RemovalReason> {
    match entry {
        Some(entry) if entry.is_downloaded() => Some(RemovalReason::Downloaded),
        Some(_) if !desired => Some(RemovalReason::NoLongerMeetsCriteria),
        Some(_) => None,
        None => Some(RemovalReason::NotInCatalog),
    }
}

/// A placeholder folder removed during cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub folder: PathBuf,
    pub title: String,
    pub reason: RemovalReason,
    pub bytes: u64,
}

/// What `reconcile_all` saw and did
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Directories scanned
    pub scanned_dirs: usize,

    /// Placeholder folders inspected
    pub checked: usize,

    /// Placeholder folders left in place
    pub kept: usize,

    /// Placeholder folders deleted
    pub removed: Vec<Removal>,

    /// Scan and removal failures
    pub failures: Vec<PlaceholderError>,
}

impl CleanupReport {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.removed.iter().map(|r| r.bytes).sum()
    }
}

/// Deletes one placeholder folder and returns the bytes it held
type RemoveFn = fn(&Path) -> io::Result<u64>;

/// Creates and removes placeholder folders
pub struct PlaceholderReconciler<'a> {
    mapper: &'a PathMapper,
    payload: &'a PayloadAsset,
    remove: RemoveFn,
}

impl std::fmt::Debug for PlaceholderReconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderReconciler")
            .field("mapper", self.mapper)
            .field("payload", self.payload)
            .finish_non_exhaustive()
    }
}

impl<'a> PlaceholderReconciler<'a> {
    pub fn new(mapper: &'a PathMapper, payload: &'a PayloadAsset) -> Self {
        Self {
            mapper,
            payload,
            remove: remove_placeholder,
        }
    }

    #[cfg(test)]
    fn with_remover(mut self, remove: RemoveFn) -> Self {
        self.remove = remove;
        self
    }

    /// Placeholder folder for a movie, or `None` without a storage path
    pub fn folder_for(&self, movie: &ClassifiedMovie) -> Option<PathBuf> {
        movie
            .storage_path()
            .map(|path| placeholder_dir(self.mapper, path, &movie.title, movie.year))
    }

    /// Create the placeholder for one movie unless it already exists
    pub fn ensure_placeholder(
        &self,
        movie: &ClassifiedMovie,
    ) -> Result<EnsureOutcome, PlaceholderError> {
        let folder = self.folder_for(movie).ok_or_else(|| PlaceholderError::MissingPath {
            title: movie.title.clone(),
        })?;

        if folder.exists() {
            debug!(title = %movie.title, folder = %folder.display(), "Placeholder already present");
            return Ok(EnsureOutcome::AlreadyPresent { folder });
        }

        fs::create_dir_all(&folder).map_err(|source| PlaceholderError::CreateDir {
            title: movie.title.clone(),
            path: folder.clone(),
            source,
        })?;

        let stem = placeholder_file_stem(&movie.title, movie.year, movie.tmdb_id);
        let file = folder.join(self.payload.file_name_for(&stem));

        let bytes = match fs::copy(&self.payload.path, &file) {
            Ok(bytes) => bytes,
            Err(source) => {
                // An empty folder would look "already present" next run
                if let Err(cleanup_err) = fs::remove_dir_all(&folder) {
                    warn!(
                        folder = %folder.display(),
                        error = %cleanup_err,
                        "Could not remove incomplete placeholder folder"
                    );
                }
                return Err(PlaceholderError::CopyPayload {
                    title: movie.title.clone(),
                    path: file,
                    source,
                });
            }
        };

        info!(
            title = %movie.title,
            file = %file.display(),
            size_mb = %format!("{:.1}", bytes as f64 / (1024.0 * 1024.0)),
            "Created placeholder"
        );

        Ok(EnsureOutcome::Created { file, bytes })
    }

    /// Placeholder folders that should exist after this run
    pub fn desired_folders<'m>(
        &self,
        movies: impl IntoIterator<Item = &'m ClassifiedMovie>,
    ) -> HashSet<PathBuf> {
        movies.into_iter().filter_map(|m| self.folder_for(m)).collect()
    }

    /// Remove placeholder folders that no longer belong to a desired movie.
    ///
    /// `catalog` must be the full catalog (not just classified movies) so that
    /// downloaded and dropped movies can be told apart from deleted ones.
    pub fn reconcile_all(
        &self,
        catalog: &[CatalogEntry],
        desired: &[ClassifiedMovie],
    ) -> CleanupReport {
        let desired_folders = self.desired_folders(desired);

        // Placeholder path -> catalog entry, for every entry with a path
        let mut lookup: HashMap<PathBuf, &CatalogEntry> = HashMap::new();
        let mut scan_dirs: BTreeSet<PathBuf> = BTreeSet::new();

        for entry in catalog {
            let Some(path) = entry.storage_path() else {
                continue;
            };
            lookup.insert(placeholder_dir(self.mapper, path, &entry.title, entry.year), entry);
            scan_dirs.insert(library_dir(self.mapper, path));
        }

        for folder in &desired_folders {
            if let Some(parent) = folder.parent() {
                scan_dirs.insert(parent.to_path_buf());
            }
        }

        debug!(dirs = scan_dirs.len(), "Scanning library directories for placeholders");

        let mut report = CleanupReport::default();

        for dir in &scan_dirs {
            if !dir.is_dir() {
                continue;
            }
            report.scanned_dirs += 1;

            let folders = match placeholder_folders_in(dir) {
                Ok(folders) => folders,
                Err(source) => {
                    warn!(dir = %dir.display(), error = %source, "Failed to scan directory");
                    report.failures.push(PlaceholderError::ScanDir {
                        path: dir.clone(),
                        source,
                    });
                    continue;
                }
            };

            for folder in folders {
                report.checked += 1;
                let entry = lookup.get(&folder).copied();
                let is_desired = desired_folders.contains(&folder);

                let Some(reason) = removal_reason(entry, is_desired) else {
                    debug!(folder = %folder.display(), "Keeping placeholder");
                    report.kept += 1;
                    continue;
                };

                let title = match entry {
                    Some(entry) => entry.title.clone(),
                    None => folder
                        .file_name()
                        .map(|name| title_from_folder(&name.to_string_lossy()))
                        .unwrap_or_else(|| "Unknown Movie".to_string()),
                };

                match (self.remove)(&folder) {
                    Ok(bytes) => {
                        info!(
                            %title,
                            %reason,
                            freed_mb = %format!("{:.1}", bytes as f64 / (1024.0 * 1024.0)),
                            "Removed placeholder"
                        );
                        report.removed.push(Removal {
                            folder,
                            title,
                            reason,
                            bytes,
                        });
                    }
                    Err(source) => {
                        error!(
                            %title,
                            folder = %folder.display(),
                            error = %source,
                            "Failed to remove placeholder"
                        );
                        report.failures.push(PlaceholderError::Remove {
                            title,
                            path: folder,
                            source,
                        });
                    }
                }
            }
        }

        report
    }
}

/// Direct child directories of `dir` whose name contains the marker
fn placeholder_folders_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut folders = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(PLACEHOLDER_MARKER) {
            folders.push(entry.path());
        }
    }

    folders.sort();
    Ok(folders)
}

/// Delete a placeholder folder, returning the bytes it held
fn remove_placeholder(folder: &Path) -> io::Result<u64> {
    let bytes = WalkDir::new(folder)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum();

    fs::remove_dir_all(folder)?;
    Ok(bytes)
}
