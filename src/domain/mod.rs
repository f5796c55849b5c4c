//! Domain types for comingsoon.
//!
//! This module contains the core data structures:
//! - CatalogEntry: a movie as the catalog server reports it
//! - ClassifiedMovie: a movie that qualifies for a placeholder
//! - RunSummary: counters reported at the end of a run

pub mod movie;
pub mod run;

// Re-export commonly used types
pub use movie::{CatalogEntry, ClassifiedMovie, ReleaseType};
pub use run::RunSummary;
