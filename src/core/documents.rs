//! Overlay and collection documents.
//!
//! Both documents are rebuilt from scratch every run and fully replace the
//! previous files. Building is pure: classified movies plus the typed
//! override sections in, a YAML value out.
//!
//! Only movies with a TMDB id are listed; the others still get placeholders
//! but cannot be targeted by id.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};

use crate::config::{BackdropSection, CollectionSection, OverlaySections, TextSection};
use crate::core::classifier::Classification;
use crate::core::date_format::{format_date, DEFAULT_DATE_FORMAT};
use crate::domain::ClassifiedMovie;

/// Overlay document file name inside the output directory
pub const OVERLAY_FILE: &str = "COMINGSOON_MOVIES_OVERLAYS.yml";

/// Collection document file name inside the output directory
pub const COLLECTION_FILE: &str = "COMINGSOON_MOVIES_COLLECTION.yml";

/// Written instead of an empty overlay structure
pub const NO_MATCHES_SENTINEL: &str = "#No matching movies found";

const DEFAULT_BACKDROP_NAME: &str = "backdrop";
const DEFAULT_FUTURE_TEXT: &str = "Coming Soon";
const DEFAULT_RELEASED_TEXT: &str = "Available Now";
const DEFAULT_COLLECTION_NAME: &str = "Upcoming Movies";
const DEFAULT_SYNC_MODE: &str = "sync";

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Usable TMDB id of `movie`; Radarr reports 0 for "unknown"
fn tmdb_id(movie: &ClassifiedMovie) -> Option<u64> {
    movie.tmdb_id.filter(|&id| id != 0)
}

/// Sorted, de-duplicated TMDB ids of `movies`
fn tmdb_ids<'a>(movies: impl IntoIterator<Item = &'a ClassifiedMovie>) -> BTreeSet<u64> {
    movies.into_iter().filter_map(tmdb_id).collect()
}

/// "1, 2, 3"
fn join_ids(ids: &BTreeSet<u64>) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// Overlay document
// ============================================================================

/// The overlay document
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDocument {
    /// Both buckets were empty
    NoMatches,

    /// Block key -> `{overlay, tmdb_movie}`, in emission order
    Overlays(Mapping),
}

impl OverlayDocument {
    /// Blocks in emission order (empty for the sentinel)
    pub fn blocks(&self) -> Option<&Mapping> {
        match self {
            Self::NoMatches => None,
            Self::Overlays(blocks) => Some(blocks),
        }
    }

    /// Serialize for writing
    pub fn render(&self) -> Result<String> {
        match self {
            Self::NoMatches => Ok(NO_MATCHES_SENTINEL.to_string()),
            Self::Overlays(blocks) => {
                let mut root = Mapping::new();
                root.insert(key("overlays"), Value::Mapping(blocks.clone()));
                serde_yaml::to_string(&root).context("Failed to serialize overlay document")
            }
        }
    }
}

fn overlay_block(name: String, extra: &Mapping, ids: &BTreeSet<u64>) -> Value {
    let mut overlay = Mapping::new();
    overlay.insert(key("name"), Value::String(name));
    for (k, v) in extra {
        overlay.insert(k.clone(), v.clone());
    }

    let mut block = Mapping::new();
    block.insert(key("overlay"), Value::Mapping(overlay));
    block.insert(key("tmdb_movie"), Value::String(join_ids(ids)));
    Value::Mapping(block)
}

fn backdrop_block(section: &BackdropSection, ids: &BTreeSet<u64>) -> Value {
    let name = section
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_BACKDROP_NAME.to_string());
    overlay_block(name, &section.extra, ids)
}

/// "text(Coming Soon 2025-03-07)", or "{name}(Coming Soon 2025-03-07)"
fn text_name(section: &TextSection, label: &str) -> String {
    match &section.name {
        Some(base) => format!("{}({})", base, label),
        None => format!("text({})", label),
    }
}

/// Build the overlay document.
///
/// Block order: `backdrop_future`, one `comingsoon_future_<date>` per
/// distinct release date (ascending), `backdrop_released`,
/// `comingsoon_released`. A block is skipped when its section is disabled
/// or its bucket has no TMDB ids.
pub fn build_overlay_document(
    classification: &Classification,
    sections: &OverlaySections,
) -> OverlayDocument {
    if classification.is_empty() {
        return OverlayDocument::NoMatches;
    }

    let mut blocks = Mapping::new();

    let future_ids = tmdb_ids(&classification.future);
    if !future_ids.is_empty() {
        if sections.backdrop_future.enabled() {
            blocks.insert(
                key("backdrop_future"),
                backdrop_block(&sections.backdrop_future, &future_ids),
            );
        }

        let text = &sections.text_future;
        if text.enabled() {
            let template = text.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
            let use_text = text.use_text.as_deref().unwrap_or(DEFAULT_FUTURE_TEXT);
            let capitalize = text.capitalize_dates.unwrap_or(true);

            let mut by_date: BTreeMap<NaiveDate, BTreeSet<u64>> = BTreeMap::new();
            for movie in &classification.future {
                if let Some(id) = tmdb_id(movie) {
                    by_date.entry(movie.release_date).or_default().insert(id);
                }
            }

            for (date, ids) in &by_date {
                let label = format!("{} {}", use_text, format_date(*date, template, capitalize));
                // ISO date keeps keys unique even when the template is not
                let block_key = format!("comingsoon_future_{}", date.format("%Y-%m-%d"));
                blocks.insert(
                    Value::String(block_key),
                    overlay_block(text_name(text, &label), &text.extra, ids),
                );
            }
        }
    }

    let released_ids = tmdb_ids(&classification.released);
    if !released_ids.is_empty() {
        if sections.backdrop_released.enabled() {
            blocks.insert(
                key("backdrop_released"),
                backdrop_block(&sections.backdrop_released, &released_ids),
            );
        }

        let text = &sections.text_released;
        if text.enabled() {
            // date_format / capitalize_dates do not apply here
            let use_text = text.use_text.as_deref().unwrap_or(DEFAULT_RELEASED_TEXT);
            blocks.insert(
                key("comingsoon_released"),
                overlay_block(text_name(text, use_text), &text.extra, &released_ids),
            );
        }
    }

    OverlayDocument::Overlays(blocks)
}

// ============================================================================
// Collection document
// ============================================================================

/// Which shape the collection body took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Id-based criterion listing every classified movie
    Movies,

    /// Nothing classified: strip the label from whatever still carries it
    EmptyFallback,

    /// Movies classified but none has a TMDB id
    NoIdsFallback,
}

/// The collection document: one named collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDocument {
    pub name: String,
    pub kind: CollectionKind,
    pub body: Mapping,
}

impl CollectionDocument {
    /// Serialize for writing. A textual `sort_title` is double-quoted.
    pub fn render(&self) -> Result<String> {
        let mut collections = Mapping::new();
        collections.insert(Value::String(self.name.clone()), Value::Mapping(self.body.clone()));

        let mut root = Mapping::new();
        root.insert(key("collections"), Value::Mapping(collections));

        let yaml = serde_yaml::to_string(&root).context("Failed to serialize collection document")?;

        match self.body.get("sort_title") {
            Some(Value::String(title)) if !title.contains('\n') => quote_sort_title(&yaml, title),
            _ => Ok(yaml),
        }
    }
}

/// Rewrite the `sort_title` line of the rendered body with a double-quoted
/// scalar. JSON string syntax is valid YAML double-quoted syntax.
fn quote_sort_title(yaml: &str, title: &str) -> Result<String> {
    const PREFIX: &str = "    sort_title: ";

    let quoted = serde_json::to_string(title).context("Failed to quote sort_title")?;
    let mut out = String::with_capacity(yaml.len() + 2);
    let mut replaced = false;

    for line in yaml.lines() {
        if !replaced && line.starts_with(PREFIX) {
            out.push_str(PREFIX);
            out.push_str(&quoted);
            replaced = true;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    Ok(out)
}

/// 30.0 -> "30", 7.5 -> "7.5"
fn format_days(days: f64) -> String {
    if days.is_finite() && days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        days.to_string()
    }
}

/// User override keys in a stable order: summary, sort_title, the
/// pass-through keys, sync_mode (only when set).
fn override_pairs(section: &CollectionSection, horizon_days: f64) -> Vec<(Value, Value)> {
    let summary = section.summary.clone().unwrap_or_else(|| {
        Value::String(format!(
            "Movies releasing within {} days or already released but not yet available",
            format_days(horizon_days)
        ))
    });

    let mut pairs = vec![(key("summary"), summary)];
    if let Some(sort_title) = &section.sort_title {
        pairs.push((key("sort_title"), sort_title.clone()));
    }
    for (k, v) in &section.extra {
        pairs.push((k.clone(), v.clone()));
    }
    if let Some(sync_mode) = &section.sync_mode {
        pairs.push((key("sync_mode"), sync_mode.clone()));
    }
    pairs
}

fn label_search(name: &str) -> Value {
    let mut all = Mapping::new();
    all.insert(key("label"), Value::String(name.to_string()));
    let mut search = Mapping::new();
    search.insert(key("all"), Value::Mapping(all));
    Value::Mapping(search)
}

/// Build the collection document from every classified movie.
pub fn build_collection_document(
    classification: &Classification,
    section: &CollectionSection,
    horizon_days: f64,
) -> CollectionDocument {
    let name = section
        .collection_name
        .clone()
        .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
    let overrides = override_pairs(section, horizon_days);
    let ids = tmdb_ids(classification.all());

    if classification.is_empty() || ids.is_empty() {
        let kind = if classification.is_empty() {
            CollectionKind::EmptyFallback
        } else {
            CollectionKind::NoIdsFallback
        };

        let mut body = Mapping::new();
        body.insert(key("plex_search"), label_search(&name));
        match kind {
            CollectionKind::EmptyFallback => {
                body.insert(key("item_label.remove"), Value::String(name.clone()));
                body.insert(key("smart_label"), key("random"));
            }
            _ => {
                body.insert(key("non_item_remove_label"), Value::String(name.clone()));
            }
        }
        body.insert(key("build_collection"), Value::Bool(false));

        // Overrides replace fallback values in place, new keys go last
        for (k, v) in overrides {
            body.insert(k, v);
        }

        return CollectionDocument { name, kind, body };
    }

    let mut summary = None;
    let mut sort_title = None;
    let mut sync_mode = None;
    let mut rest = Vec::new();
    for (k, v) in overrides {
        match k.as_str() {
            Some("summary") => summary = Some(v),
            Some("sort_title") => sort_title = Some(v),
            Some("sync_mode") => sync_mode = Some(v),
            Some("tmdb_movie") => {}
            _ => rest.push((k, v)),
        }
    }

    let mut body = Mapping::new();
    if let Some(summary) = summary {
        body.insert(key("summary"), summary);
    }
    if let Some(sort_title) = sort_title {
        body.insert(key("sort_title"), sort_title);
    }
    for (k, v) in rest {
        body.insert(k, v);
    }
    body.insert(key("sync_mode"), sync_mode.unwrap_or_else(|| key(DEFAULT_SYNC_MODE)));
    body.insert(key("tmdb_movie"), Value::String(join_ids(&ids)));

    CollectionDocument {
        name,
        kind: CollectionKind::Movies,
        body,
    }
}
