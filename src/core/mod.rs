//! Core reconciliation logic.
//!
//! This module contains:
//! - Classifier: release-date bucketing of catalog entries
//! - Paths: prefix remapping and placeholder naming
//! - Reconciler: placeholder creation and cleanup on disk
//! - Documents: overlay and collection document assembly
//! - Orchestrator: one full run

pub mod classifier;
pub mod date_format;
pub mod documents;
pub mod orchestrator;
pub mod paths;
pub mod payload;
pub mod reconciler;

// Re-export commonly used types
pub use classifier::{classify, Classification, ClassifyOptions};
pub use documents::{
    build_collection_document, build_overlay_document, CollectionDocument, OverlayDocument,
};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use paths::{sanitize_name, PathMapper, PLACEHOLDER_MARKER};
pub use payload::PayloadAsset;
pub use reconciler::{
    CleanupReport, EnsureOutcome, PlaceholderError, PlaceholderReconciler, RemovalReason,
};
