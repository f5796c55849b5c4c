//! comingsoon - "Coming Soon" placeholders for upcoming movies
//!
//! Reads a Radarr movie catalog, finds monitored movies that are releasing
//! soon (or are released but not downloaded yet), and keeps a placeholder
//! folder with a short video next to each one so media servers can show
//! them early. Stale placeholders are removed once the real file arrives.
//!
//! # Architecture
//!
//! One run is a fixed pipeline:
//! - Classify catalog entries into upcoming and released buckets
//! - Create the missing placeholder folders
//! - Remove placeholders that no longer belong to a classified movie
//! - Write an overlay document and a collection document
//!
//! # Modules
//!
//! - `adapters`: Catalog sources (Radarr HTTP, JSON snapshot)
//! - `core`: Classification, path mapping, reconciliation, documents
//! - `domain`: Data structures (CatalogEntry, ClassifiedMovie, RunSummary)
//! - `config`: Config file schema and resolved run configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # One full run against Radarr
//! comingsoon run
//!
//! # Preview against a saved movie list
//! comingsoon preview --catalog-file movies.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{CatalogSource, RadarrClient, SnapshotCatalog};
pub use config::RunConfig;
pub use crate::core::{Orchestrator, RunOutcome};
pub use domain::{CatalogEntry, ClassifiedMovie, ReleaseType, RunSummary};
