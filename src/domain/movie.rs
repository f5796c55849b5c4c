//! Catalog and classification types.
//!
//! `CatalogEntry` mirrors the movie records the catalog server returns;
//! `ClassifiedMovie` is what survives classification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single movie as reported by the catalog server (read-only input)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Movie title
    pub title: String,

    /// TMDB id (primary id)
    #[serde(default)]
    pub tmdb_id: Option<u64>,

    /// IMDb id (secondary id, e.g. "tt0133093")
    #[serde(default)]
    pub imdb_id: Option<String>,

    /// Whether the movie is monitored. Absent means "not monitored".
    #[serde(default)]
    pub monitored: Option<bool>,

    /// Whether the real movie file is already present. Absent means "unknown".
    #[serde(default)]
    pub has_file: Option<bool>,

    /// Storage path of the movie folder as the catalog server sees it
    #[serde(default)]
    pub path: Option<String>,

    /// Folder name reported by the catalog server
    #[serde(default)]
    pub folder_name: Option<String>,

    /// Release year
    #[serde(default)]
    pub year: Option<i32>,

    /// Digital release timestamp (UTC)
    #[serde(default)]
    pub digital_release: Option<DateTime<Utc>>,

    /// Physical release timestamp (UTC)
    #[serde(default)]
    pub physical_release: Option<DateTime<Utc>>,

    /// Theatrical release timestamp (UTC)
    #[serde(default)]
    pub in_cinemas: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    /// Create an entry with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// True only when the server explicitly says the movie is monitored
    pub fn is_monitored(&self) -> bool {
        self.monitored == Some(true)
    }

    /// True only when the server explicitly says the file is present
    pub fn is_downloaded(&self) -> bool {
        self.has_file == Some(true)
    }

    /// Storage path, treating an empty string as missing
    pub fn storage_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    pub fn with_tmdb_id(mut self, id: u64) -> Self {
        self.tmdb_id = Some(id);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_flags(mut self, monitored: bool, has_file: bool) -> Self {
        self.monitored = Some(monitored);
        self.has_file = Some(has_file);
        self
    }

    pub fn with_digital_release(mut self, at: DateTime<Utc>) -> Self {
        self.digital_release = Some(at);
        self
    }

    pub fn with_physical_release(mut self, at: DateTime<Utc>) -> Self {
        self.physical_release = Some(at);
        self
    }

    pub fn with_in_cinemas(mut self, at: DateTime<Utc>) -> Self {
        self.in_cinemas = Some(at);
        self
    }
}

/// Which release date was used to classify a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Digital,
    Physical,
    Cinema,
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseType::Digital => write!(f, "Digital"),
            ReleaseType::Physical => write!(f, "Physical"),
            ReleaseType::Cinema => write!(f, "Cinema"),
        }
    }
}

/// A catalog entry that qualified for a placeholder during this run.
///
/// Built once by the classifier and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedMovie {
    pub title: String,
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub path: Option<String>,
    pub folder_name: Option<String>,
    pub year: Option<i32>,

    /// Local calendar date of the chosen release
    pub release_date: NaiveDate,

    /// Which release field produced `release_date`
    pub release_type: ReleaseType,
}

impl ClassifiedMovie {
    /// Build from a catalog entry and its resolved release
    pub fn from_entry(
        entry: &CatalogEntry,
        release_date: NaiveDate,
        release_type: ReleaseType,
    ) -> Self {
        Self {
            title: entry.title.clone(),
            tmdb_id: entry.tmdb_id,
            imdb_id: entry.imdb_id.clone(),
            path: entry.path.clone(),
            folder_name: entry.folder_name.clone(),
            year: entry.year,
            release_date,
            release_type,
        }
    }

    /// Storage path, treating an empty string as missing
    pub fn storage_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    /// "Title (2024)" or just "Title" when the year is unknown
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}
