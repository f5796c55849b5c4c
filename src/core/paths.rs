//! Path remapping and placeholder naming.
//!
//! The catalog server often sees the library under a different mount point
//! than this process does, so storage paths go through prefix rewrite rules
//! before touching the filesystem.
//!
//! Placeholder layout, next to the movie folder:
//!
//! ```text
//! /movies/
//! ├── Some Movie (2025)/                          # real movie folder (may not exist yet)
//! └── Some Movie (2025) {edition-Coming Soon}/    # placeholder folder
//!     └── Some Movie (2025) {tmdb-123} {edition-Coming Soon}.mp4
//! ```

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::config::ConfigError;

/// Marker every placeholder folder name carries
pub const PLACEHOLDER_MARKER: &str = "{edition-Coming Soon}";

/// A single `from → to` prefix rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pub from: String,
    pub to: String,
}

/// Ordered prefix rewrite rules.
///
/// The longest matching `from` wins. Among equal-length matches the rule
/// declared first wins. Matching is a plain string prefix test, so
/// `/movies` also matches `/movies2/x`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapper {
    rules: Vec<PathRule>,
}

impl PathMapper {
    /// Build from `(from, to)` pairs in declaration order
    pub fn new<I, F, T>(rules: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let mut rules: Vec<PathRule> = rules
            .into_iter()
            .map(|(from, to)| PathRule {
                from: from.into(),
                to: to.into(),
            })
            .collect();

        // Stable sort keeps declaration order among equal lengths
        rules.sort_by(|a, b| b.from.len().cmp(&a.from.len()));

        Self { rules }
    }

    /// Build from the `path_mapping` config mapping
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, ConfigError> {
        let mut pairs = Vec::with_capacity(mapping.len());

        for (from, to) in mapping {
            let from = scalar_string(from).ok_or_else(|| ConfigError::InvalidPathMapping {
                detail: format!("source prefix must be a string, got {:?}", from),
            })?;
            let to = scalar_string(to).ok_or_else(|| ConfigError::InvalidPathMapping {
                detail: format!("target for '{}' must be a string, got {:?}", from, to),
            })?;
            pairs.push((from, to));
        }

        Ok(Self::new(pairs))
    }

    /// Rules in match order (longest first)
    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite a catalog path to the local filesystem path
    pub fn resolve(&self, raw: &str) -> String {
        for rule in &self.rules {
            if let Some(rest) = raw.strip_prefix(rule.from.as_str()) {
                let mapped = format!("{}{}", rule.to, rest);
                debug!(from = %raw, to = %mapped, "Path mapped");
                return mapped;
            }
        }

        raw.to_string()
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Make a name safe for Windows/UNC shares.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        match c {
            ':' => out.push_str(" -"),
            '/' | '\\' | '|' => out.push('-'),
            '?' | '*' => {}
            '"' => out.push('\''),
            '<' => out.push('('),
            '>' => out.push(')'),
            _ => out.push(c),
        }
    }

    out.trim_end_matches(['.', ' ']).to_string()
}

fn year_label(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_default()
}

/// Placeholder folder name: "Title (Year) {edition-Coming Soon}"
pub fn placeholder_folder_name(title: &str, year: Option<i32>) -> String {
    sanitize_name(&format!("{} ({}) {}", title, year_label(year), PLACEHOLDER_MARKER))
}

/// Placeholder file stem: "Title (Year) {tmdb-ID} {edition-Coming Soon}"
pub fn placeholder_file_stem(title: &str, year: Option<i32>, tmdb_id: Option<u64>) -> String {
    let id = tmdb_id.map(|id| id.to_string()).unwrap_or_default();
    sanitize_name(&format!(
        "{} ({}) {{tmdb-{}}} {}",
        title,
        year_label(year),
        id,
        PLACEHOLDER_MARKER
    ))
}

/// Directory that holds the movie folder (after mapping)
pub fn library_dir(mapper: &PathMapper, storage_path: &str) -> PathBuf {
    let mapped = PathBuf::from(mapper.resolve(storage_path));
    mapped
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(mapped)
}

/// Absolute placeholder folder for a movie stored at `storage_path`
pub fn placeholder_dir(
    mapper: &PathMapper,
    storage_path: &str,
    title: &str,
    year: Option<i32>,
) -> PathBuf {
    library_dir(mapper, storage_path).join(placeholder_folder_name(title, year))
}

/// Best-effort title for a placeholder folder with no catalog entry
pub fn title_from_folder(folder_name: &str) -> String {
    folder_name
        .replace(&format!(" {}", PLACEHOLDER_MARKER), "")
        .trim()
        .to_string()
}
