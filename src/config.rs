//! Configuration for comingsoon.
//!
//! Configuration sources (highest priority first):
//! 1. `--config <path>` on the command line
//! 2. `COMINGSOON_CONFIG` environment variable
//! 3. `config/config.yml` in the current directory
//!
//! `RADARR_URL` / `RADARR_API_KEY` override the values from the file.
//!
//! The file is parsed once into [`ConfigFile`] and resolved into an immutable
//! [`RunConfig`] that is passed to every component. Nothing reads the
//! environment after that.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::core::classifier::ClassifyOptions;
use crate::core::paths::PathMapper;

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yml";

/// Invalid values found while resolving the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid path_mapping: {detail}")]
    InvalidPathMapping { detail: String },

    #[error("Config file not found: {}", .path.display())]
    NotFound { path: PathBuf },
}

// ============================================================================
// File schema
// ============================================================================

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub radarr_url: Option<String>,

    #[serde(default)]
    pub radarr_api_key: Option<String>,

    #[serde(default = "default_future_days", deserialize_with = "deserialize_number")]
    pub future_days_upcoming_movies: f64,

    #[serde(default, deserialize_with = "deserialize_number")]
    pub utc_offset: f64,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub future_only: bool,

    #[serde(rename = "include_inCinemas", default, deserialize_with = "deserialize_flag")]
    pub include_in_cinemas: bool,

    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub cleanup: bool,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub debug: bool,

    /// Catalog prefix -> local prefix, in declaration order
    #[serde(default)]
    pub path_mapping: Option<Mapping>,

    #[serde(default)]
    pub backdrop_upcoming_movies_future: Option<BackdropSection>,

    #[serde(default)]
    pub text_upcoming_movies_future: Option<TextSection>,

    #[serde(default)]
    pub backdrop_upcoming_movies_released: Option<BackdropSection>,

    #[serde(default)]
    pub text_upcoming_movies_released: Option<TextSection>,

    #[serde(default)]
    pub collection_upcoming_movies: Option<CollectionSection>,

    /// Directory holding the placeholder video
    #[serde(default)]
    pub placeholder_dir: Option<String>,

    /// File stem of the placeholder video
    #[serde(default)]
    pub placeholder_stem: Option<String>,

    /// Where the overlay/collection documents are written
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            radarr_url: None,
            radarr_api_key: None,
            future_days_upcoming_movies: default_future_days(),
            utc_offset: 0.0,
            future_only: false,
            include_in_cinemas: false,
            cleanup: default_true(),
            debug: false,
            path_mapping: None,
            backdrop_upcoming_movies_future: None,
            text_upcoming_movies_future: None,
            backdrop_upcoming_movies_released: None,
            text_upcoming_movies_released: None,
            collection_upcoming_movies: None,
            placeholder_dir: None,
            placeholder_stem: None,
            output_dir: None,
        }
    }
}

impl ConfigFile {
    /// Load and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse config YAML. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid config YAML")
    }
}

fn default_future_days() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

/// Booleans may be written as YAML booleans or as "true"/"false" strings.
/// Anything else counts as false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag_value(&value))
}

fn deserialize_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(flag_value(&other)),
    })
}

fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Numbers may be written bare or quoted
fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number out of range: {}", n)))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s)))?,
        other => return Err(D::Error::custom(format!("expected a number, got {:?}", other))),
    };

    if !number.is_finite() {
        return Err(D::Error::custom(format!("expected a finite number, got {}", number)));
    }
    Ok(number)
}

// ============================================================================
// Override sections
// ============================================================================

/// Overrides for a backdrop overlay block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackdropSection {
    /// Emit the block at all (default true)
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub enable: Option<bool>,

    /// Overlay name (default "backdrop")
    #[serde(default)]
    pub name: Option<String>,

    /// Styling keys passed through untouched, in file order
    #[serde(flatten)]
    pub extra: Mapping,
}

impl BackdropSection {
    pub fn enabled(&self) -> bool {
        self.enable.unwrap_or(true)
    }
}

/// Overrides for a text overlay block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextSection {
    /// Emit the block(s) at all (default true)
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub enable: Option<bool>,

    /// Base overlay name; the label is appended to it
    #[serde(default)]
    pub name: Option<String>,

    /// Date template for upcoming blocks (ignored for released)
    #[serde(default)]
    pub date_format: Option<String>,

    /// Label text ("Coming Soon" / "Available Now" by default)
    #[serde(default)]
    pub use_text: Option<String>,

    /// Upper-case formatted dates (default true; ignored for released)
    #[serde(default, deserialize_with = "deserialize_optional_flag")]
    pub capitalize_dates: Option<bool>,

    /// Styling keys passed through untouched, in file order
    #[serde(flatten)]
    pub extra: Mapping,
}

impl TextSection {
    pub fn enabled(&self) -> bool {
        self.enable.unwrap_or(true)
    }
}

/// Overrides for the collection document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionSection {
    /// Collection title (default "Upcoming Movies")
    #[serde(default)]
    pub collection_name: Option<String>,

    #[serde(default)]
    pub summary: Option<Value>,

    /// Emitted double-quoted when it is a string
    #[serde(default)]
    pub sort_title: Option<Value>,

    /// Default "sync"
    #[serde(default)]
    pub sync_mode: Option<Value>,

    /// Any other collection keys, in file order
    #[serde(flatten)]
    pub extra: Mapping,
}

/// The four overlay override sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlaySections {
    pub backdrop_future: BackdropSection,
    pub text_future: TextSection,
    pub backdrop_released: BackdropSection,
    pub text_released: TextSection,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Resolved, immutable configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Catalog server URL (as configured; discovery happens later)
    pub radarr_url: Option<String>,

    /// Catalog server API key
    pub radarr_api_key: Option<String>,

    /// Classification knobs
    pub classify: ClassifyOptions,

    /// Remove stale placeholders after creating new ones
    pub cleanup: bool,

    /// Verbose logging requested by the config file
    pub debug: bool,

    /// Catalog → filesystem path rewrites
    pub path_mapper: PathMapper,

    /// Overlay document overrides
    pub overlays: OverlaySections,

    /// Collection document overrides
    pub collection: CollectionSection,

    /// Directory holding the placeholder video
    pub placeholder_dir: PathBuf,

    /// Placeholder video file stem
    pub placeholder_stem: String,

    /// Output directory for generated documents
    pub output_dir: PathBuf,

    /// Config file this was loaded from (if any)
    pub config_file: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::assemble(ConfigFile::default(), PathMapper::default(), None)
    }
}

impl RunConfig {
    /// Locate, load and resolve the config file, then apply env overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit);
        if !path.is_file() {
            return Err(ConfigError::NotFound { path }.into());
        }

        let file = ConfigFile::from_file(&path)?;
        let mut config = Self::resolve(file, Some(&path))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`RunConfig::load`], but a missing config file yields the defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit);
        if path.is_file() {
            return Self::load(Some(&path));
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn config_path(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => std::env::var("COMINGSOON_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    /// Turn a parsed file into a validated run configuration.
    ///
    /// Relative paths are resolved against the directory that holds the
    /// `config/` folder (the project root), or kept relative without a file.
    pub fn resolve(file: ConfigFile, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path_mapper = match &file.path_mapping {
            Some(mapping) => PathMapper::from_mapping(mapping)?,
            None => PathMapper::default(),
        };

        Ok(Self::assemble(file, path_mapper, config_path))
    }

    fn assemble(file: ConfigFile, path_mapper: PathMapper, config_path: Option<&Path>) -> Self {
        let base_dir = config_path
            .and_then(Path::parent) // config/
            .and_then(Path::parent) // project root
            .map(Path::to_path_buf);

        let resolve = |value: Option<&str>, default: &str| -> PathBuf {
            let raw = value.unwrap_or(default);
            match &base_dir {
                Some(base) => resolve_path(base, raw),
                None => PathBuf::from(raw),
            }
        };

        Self {
            radarr_url: file.radarr_url,
            radarr_api_key: file.radarr_api_key,
            classify: ClassifyOptions {
                horizon_days: file.future_days_upcoming_movies,
                utc_offset_hours: file.utc_offset,
                future_only: file.future_only,
                include_in_cinemas: file.include_in_cinemas,
            },
            cleanup: file.cleanup,
            debug: file.debug,
            path_mapper,
            overlays: OverlaySections {
                backdrop_future: file.backdrop_upcoming_movies_future.unwrap_or_default(),
                text_future: file.text_upcoming_movies_future.unwrap_or_default(),
                backdrop_released: file.backdrop_upcoming_movies_released.unwrap_or_default(),
                text_released: file.text_upcoming_movies_released.unwrap_or_default(),
            },
            collection: file.collection_upcoming_movies.unwrap_or_default(),
            placeholder_dir: resolve(file.placeholder_dir.as_deref(), "video"),
            placeholder_stem: file
                .placeholder_stem
                .unwrap_or_else(|| "coming-soon".to_string()),
            output_dir: resolve(file.output_dir.as_deref(), "kometa"),
            config_file: config_path.map(Path::to_path_buf),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RADARR_URL") {
            self.radarr_url = Some(url);
        }
        if let Ok(key) = std::env::var("RADARR_API_KEY") {
            self.radarr_api_key = Some(key);
        }
    }

    /// Override the output directory (CLI flag)
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.classify.horizon_days, 30.0);
        assert_eq!(config.classify.utc_offset_hours, 0.0);
        assert!(!config.classify.future_only);
        assert!(!config.classify.include_in_cinemas);
        assert!(config.cleanup);
        assert!(config.path_mapper.is_empty());
        assert_eq!(config.output_dir, PathBuf::from("kometa"));
        assert_eq!(config.placeholder_dir, PathBuf::from("video"));
        assert_eq!(config.placeholder_stem, "coming-soon");
        assert!(config.overlays.backdrop_future.enabled());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let file = ConfigFile::from_yaml("  \n").unwrap();
        assert_eq!(file.future_days_upcoming_movies, 30.0);
        assert!(file.cleanup);
    }

    #[test]
    fn test_config_file_parsing() {
        let yaml = r##"
radarr_url: http://localhost:7878
radarr_api_key: abc123
future_days_upcoming_movies: 45
utc_offset: -4.5
future_only: "True"
include_inCinemas: true
cleanup: "false"
debug: false
path_mapping:
  /data/movies: /mnt/movies
  /data: /mnt
backdrop_upcoming_movies_future:
  enable: false
  back_color: "#000000"
text_upcoming_movies_future:
  date_format: mmm d
  use_text: SOON
  capitalize_dates: false
  font_size: 60
  horizontal_align: center
collection_upcoming_movies:
  collection_name: Soon
  sort_title: "+1_Soon"
  visible_home: true
"##;

        let file = ConfigFile::from_yaml(yaml).unwrap();
        let config = RunConfig::resolve(file, None).unwrap();

        assert_eq!(config.radarr_url.as_deref(), Some("http://localhost:7878"));
        assert_eq!(config.classify.horizon_days, 45.0);
        assert_eq!(config.classify.utc_offset_hours, -4.5);
        assert!(config.classify.future_only);
        assert!(config.classify.include_in_cinemas);
        assert!(!config.cleanup);
        assert_eq!(config.path_mapper.resolve("/data/movies/X"), "/mnt/movies/X");

        assert!(!config.overlays.backdrop_future.enabled());
        assert_eq!(
            config.overlays.backdrop_future.extra.get("back_color"),
            Some(&Value::String("#000000".to_string()))
        );

        let text = &config.overlays.text_future;
        assert_eq!(text.date_format.as_deref(), Some("mmm d"));
        assert_eq!(text.use_text.as_deref(), Some("SOON"));
        assert_eq!(text.capitalize_dates, Some(false));
        let keys: Vec<_> = text.extra.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["font_size", "horizontal_align"]);

        assert_eq!(config.collection.collection_name.as_deref(), Some("Soon"));
        assert_eq!(config.collection.sort_title, Some(Value::String("+1_Soon".to_string())));
        assert!(config.collection.extra.contains_key("visible_home"));
    }

    #[test]
    fn test_null_sections_use_defaults() {
        let yaml = "path_mapping:\ntext_upcoming_movies_released:\n";
        let config = RunConfig::resolve(ConfigFile::from_yaml(yaml).unwrap(), None).unwrap();
        assert!(config.path_mapper.is_empty());
        assert!(config.overlays.text_released.enabled());
    }

    #[test]
    fn test_quoted_numbers_accepted() {
        let file =
            ConfigFile::from_yaml("future_days_upcoming_movies: \"14\"\nutc_offset: \"2\"\n")
                .unwrap();
        assert_eq!(file.future_days_upcoming_movies, 14.0);
        assert_eq!(file.utc_offset, 2.0);
    }

    #[test]
    fn test_bad_number_rejected() {
        assert!(ConfigFile::from_yaml("utc_offset: soon\n").is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(ConfigFile::from_yaml("future_days_upcoming_movies: .inf\n").is_err());
        assert!(ConfigFile::from_yaml("utc_offset: -.inf\n").is_err());
        assert!(ConfigFile::from_yaml("utc_offset: .nan\n").is_err());
        assert!(ConfigFile::from_yaml("future_days_upcoming_movies: \"inf\"\n").is_err());

        // Huge but finite values load; the classifier saturates them
        let file = ConfigFile::from_yaml("future_days_upcoming_movies: 100000000\n").unwrap();
        assert_eq!(file.future_days_upcoming_movies, 100_000_000.0);
    }

    #[test]
    fn test_bad_path_mapping_rejected() {
        let file = ConfigFile::from_yaml("path_mapping:\n  /data: [1, 2]\n").unwrap();
        assert!(matches!(
            RunConfig::resolve(file, None),
            Err(ConfigError::InvalidPathMapping { .. })
        ));
    }

    #[test]
    fn test_load_resolves_paths_against_project_root() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "output_dir: out\nplaceholder_dir: /abs/video").unwrap();

        let config = RunConfig::load(Some(&config_path)).unwrap();
        assert_eq!(config.output_dir, temp.path().join("out"));
        assert_eq!(config.placeholder_dir, PathBuf::from("/abs/video"));
        assert_eq!(config.config_file.as_deref(), Some(config_path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = RunConfig::load(Some(&temp.path().join("nope.yml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let temp = TempDir::new().unwrap();
        let config = RunConfig::load_or_default(Some(&temp.path().join("nope.yml"))).unwrap();
        assert!(config.config_file.is_none());
        assert_eq!(config.classify.horizon_days, 30.0);
        assert_eq!(config.output_dir, PathBuf::from("kometa"));
        assert!(config.path_mapper.is_empty());
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config/config.yml");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, "future_days_upcoming_movies: 5\n").unwrap();

        let config = RunConfig::load_or_default(Some(&config_path)).unwrap();
        assert_eq!(config.classify.horizon_days, 5.0);
        assert_eq!(config.config_file.as_deref(), Some(config_path.as_path()));
    }
}
