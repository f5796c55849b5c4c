//! One full run.
//!
//! Order is fixed: payload lookup, catalog fetch, classification,
//! placeholder creation, cleanup, documents. Only the first two (and the
//! document write) can fail the run; everything per-movie is counted and
//! reported instead.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};

use crate::adapters::CatalogSource;
use crate::config::RunConfig;
use crate::domain::{CatalogEntry, ClassifiedMovie, RunSummary};

use super::classifier::{classify, Classification};
use super::documents::{
    build_collection_document, build_overlay_document, CollectionDocument, OverlayDocument,
    COLLECTION_FILE, OVERLAY_FILE,
};
use super::payload::PayloadAsset;
use super::reconciler::{CleanupReport, EnsureOutcome, PlaceholderError, PlaceholderReconciler};

/// Everything a run produced, for reporting
#[derive(Debug)]
pub struct RunOutcome {
    /// Counters
    pub summary: RunSummary,

    /// The classified movies
    pub classification: Classification,

    /// Placeholders that could not be created
    pub create_failures: Vec<PlaceholderError>,

    /// Cleanup details (None when cleanup was off or dry run)
    pub cleanup: Option<CleanupReport>,

    /// Built overlay document
    pub overlay: OverlayDocument,

    /// Built collection document
    pub collection: CollectionDocument,

    /// Files written (empty on dry run)
    pub written: Vec<PathBuf>,
}

/// Drives a run against one catalog source
pub struct Orchestrator<C: CatalogSource> {
    config: RunConfig,
    catalog: C,
    dry_run: bool,
}

impl<C: CatalogSource> Orchestrator<C> {
    /// Create an orchestrator
    pub fn new(config: RunConfig, catalog: C) -> Self {
        Self {
            config,
            catalog,
            dry_run: false,
        }
    }

    /// Classify and build documents without touching the filesystem
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Fetch and classify only
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<Classification> {
        let catalog = self.fetch().await?;
        Ok(classify(&catalog, &self.config.classify, now))
    }

    /// Execute one run
    #[instrument(skip(self), fields(source = %self.catalog.name(), dry_run = self.dry_run))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let started = Instant::now();

        let payload =
            PayloadAsset::locate(&self.config.placeholder_dir, &self.config.placeholder_stem)?;
        info!(
            payload = %payload.path.display(),
            size_mb = %format!("{:.1}", payload.size_mb()),
            "Using placeholder video"
        );

        let catalog = self.fetch().await?;
        let classification = classify(&catalog, &self.config.classify, now);

        let mut summary = RunSummary {
            started_at: Some(now),
            future: classification.future.len(),
            released: classification.released.len(),
            dry_run: self.dry_run,
            ..Default::default()
        };

        let mut create_failures = Vec::new();
        let mut cleanup = None;

        if self.dry_run {
            info!("Dry run: leaving placeholders untouched");
        } else {
            let reconciler = PlaceholderReconciler::new(&self.config.path_mapper, &payload);

            for movie in classification.all() {
                match reconciler.ensure_placeholder(movie) {
                    Ok(EnsureOutcome::Created { .. }) => summary.created += 1,
                    Ok(EnsureOutcome::AlreadyPresent { .. }) => summary.already_present += 1,
                    Err(e) => {
                        error!(
                            title = %movie.display_title(),
                            error = %e,
                            "Failed to create placeholder"
                        );
                        summary.create_failures += 1;
                        create_failures.push(e);
                    }
                }
            }

            if self.config.cleanup {
                let desired: Vec<ClassifiedMovie> = classification.all().cloned().collect();
                let report = reconciler.reconcile_all(&catalog, &desired);

                summary.cleanup_ran = true;
                summary.checked = report.checked;
                summary.removed = report.removed.len();
                summary.bytes_reclaimed = report.bytes_reclaimed();
                summary.cleanup_failures = report.failures.len();
                cleanup = Some(report);
            } else {
                debug!("Cleanup disabled");
            }
        }

        let overlay = build_overlay_document(&classification, &self.config.overlays);
        let collection = build_collection_document(
            &classification,
            &self.config.collection,
            self.config.classify.horizon_days,
        );

        let written = if self.dry_run {
            Vec::new()
        } else {
            write_documents(&self.config.output_dir, &overlay, &collection).await?
        };

        summary.elapsed = started.elapsed();
        info!(
            future = summary.future,
            released = summary.released,
            created = summary.created,
            removed = summary.removed,
            failures = summary.failures(),
            "Run complete"
        );

        Ok(RunOutcome {
            summary,
            classification,
            create_failures,
            cleanup,
            overlay,
            collection,
            written,
        })
    }

    async fn fetch(&self) -> Result<Vec<CatalogEntry>> {
        let movies = self
            .catalog
            .fetch_movies()
            .await
            .with_context(|| format!("Failed to fetch movies from {}", self.catalog.name()))?;
        debug!(count = movies.len(), "Catalog fetched");
        Ok(movies)
    }
}

/// Write both documents, replacing any previous files
pub async fn write_documents(
    output_dir: &Path,
    overlay: &OverlayDocument,
    collection: &CollectionDocument,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let overlay_path = output_dir.join(OVERLAY_FILE);
    tokio::fs::write(&overlay_path, overlay.render()?)
        .await
        .with_context(|| format!("Failed to write {}", overlay_path.display()))?;

    let collection_path = output_dir.join(COLLECTION_FILE);
    tokio::fs::write(&collection_path, collection.render()?)
        .await
        .with_context(|| format!("Failed to write {}", collection_path.display()))?;

    info!(dir = %output_dir.display(), "Documents written");
    Ok(vec![overlay_path, collection_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SnapshotCatalog;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup(temp: &TempDir) -> RunConfig {
        let video = temp.path().join("video");
        std::fs::create_dir_all(&video).unwrap();
        std::fs::write(video.join("coming-soon.mp4"), b"placeholder").unwrap();

        RunConfig {
            placeholder_dir: video,
            output_dir: temp.path().join("kometa"),
            ..RunConfig::default()
        }
    }

    fn upcoming(temp: &TempDir, title: &str, id: u64) -> CatalogEntry {
        CatalogEntry::new(title)
            .with_tmdb_id(id)
            .with_year(2025)
            .with_path(
                temp.path()
                    .join("movies")
                    .join(format!("{} (2025)", title))
                    .to_string_lossy(),
            )
            .with_flags(true, false)
            .with_digital_release(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_missing_payload_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = RunConfig {
            placeholder_dir: temp.path().join("video"),
            ..RunConfig::default()
        };
        let orchestrator = Orchestrator::new(config, SnapshotCatalog::from_entries(vec![]));
        assert!(orchestrator.run(now()).await.is_err());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let config = setup(&temp);
        let output_dir = config.output_dir.clone();

        let catalog = SnapshotCatalog::from_entries(vec![upcoming(&temp, "Heat", 949)]);
        let outcome = Orchestrator::new(config, catalog)
            .with_dry_run(true)
            .run(now())
            .await
            .unwrap();

        assert_eq!(outcome.summary.future, 1);
        assert_eq!(outcome.summary.created, 0);
        assert!(outcome.summary.dry_run);
        assert!(outcome.written.is_empty());
        assert!(outcome.cleanup.is_none());
        assert!(!temp.path().join("movies").exists());
        assert!(!output_dir.exists());
        assert!(outcome.overlay.blocks().is_some());
    }

    #[tokio::test]
    async fn test_preview_classifies_only() {
        let temp = TempDir::new().unwrap();
        let catalog = SnapshotCatalog::from_entries(vec![upcoming(&temp, "Heat", 949)]);
        let orchestrator = Orchestrator::new(RunConfig::default(), catalog);

        let classification = orchestrator.preview(now()).await.unwrap();
        assert_eq!(classification.future.len(), 1);
        assert!(!temp.path().join("movies").exists());
    }
}
