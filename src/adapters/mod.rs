//! Catalog sources.
//!
//! A catalog source returns every movie the catalog server knows about.
//! The run only reads from it.

pub mod radarr;
pub mod snapshot;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::CatalogEntry;

pub use radarr::RadarrClient;
pub use snapshot::SnapshotCatalog;

/// Trait for catalog backends
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Check the source is reachable
    async fn health_check(&self) -> Result<()>;

    /// Fetch the full movie list
    async fn fetch_movies(&self) -> Result<Vec<CatalogEntry>>;
}
