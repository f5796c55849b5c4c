//! Offline catalog source.
//!
//! Reads a saved copy of the `/api/v3/movie` response, so runs can be
//! previewed or tested without a live server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::CatalogSource;
use crate::domain::CatalogEntry;

/// Catalog backed by a JSON file or an in-memory list
pub struct SnapshotCatalog {
    /// Where the entries came from
    origin: Option<PathBuf>,

    entries: Vec<CatalogEntry>,
}

impl SnapshotCatalog {
    /// Load a JSON array of movies
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot: {}", path.display()))?;

        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog snapshot: {}", path.display()))?;

        info!(path = %path.display(), count = entries.len(), "Loaded catalog snapshot");

        Ok(Self {
            origin: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Wrap entries that are already in memory
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            origin: None,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CatalogSource for SnapshotCatalog {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn health_check(&self) -> Result<()> {
        if let Some(path) = &self.origin {
            if !path.is_file() {
                anyhow::bail!("Catalog snapshot disappeared: {}", path.display());
            }
        }
        Ok(())
    }

    async fn fetch_movies(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}
