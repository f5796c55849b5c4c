//! Locating the placeholder video.
//!
//! Every placeholder folder gets a copy of one short video. It lives in the
//! configured placeholder directory as `<stem>.<any extension>`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;

/// The video copied into every placeholder folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadAsset {
    /// Source file
    pub path: PathBuf,

    /// Extension including the leading dot (may be empty)
    pub extension: String,

    /// File size in bytes
    pub size: u64,
}

impl PayloadAsset {
    /// Find `<stem>.*` in `dir`. Absence is fatal for the run.
    pub fn locate(dir: &Path, stem: &str) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!(
                "Placeholder directory not found: {}. \
                 Create it and add a video named '{}' (any extension).",
                dir.display(),
                stem
            );
        }

        let pattern = format!(
            "{}/{}.*",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(stem)
        );

        let mut matches: Vec<PathBuf> = glob::glob(&pattern)
            .with_context(|| format!("Invalid placeholder pattern: {}", pattern))?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();

        // glob yields alphabetical order already; sort anyway for a stable pick
        matches.sort();

        let path = matches.into_iter().next().with_context(|| {
            format!(
                "Placeholder video not found in {}. Add a file named '{}' (any extension).",
                dir.display(),
                stem
            )
        })?;

        let size = std::fs::metadata(&path)
            .with_context(|| format!("Failed to stat placeholder video: {}", path.display()))?
            .len();

        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        Ok(Self {
            path,
            extension,
            size,
        })
    }

    /// File name for a placeholder copy with the given stem
    pub fn file_name_for(&self, stem: &str) -> String {
        format!("{}{}", stem, self.extension)
    }

    /// Size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}
