//! Command-line interface for comingsoon.
//!
//! Provides commands for a full run, a classification preview, and
//! inspecting the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::adapters::{CatalogSource, RadarrClient, SnapshotCatalog};
use crate::config::RunConfig;
use crate::core::reconciler::CleanupReport;
use crate::core::{Classification, Orchestrator, RunOutcome};
use crate::domain::ClassifiedMovie;

/// comingsoon - "Coming Soon" placeholders for upcoming movies
#[derive(Parser, Debug)]
#[command(name = "comingsoon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: config/config.yml)
    #[arg(short, long, global = true, env = "COMINGSOON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create/remove placeholders and write the overlay and collection files
    Run {
        /// Read movies from a saved JSON movie list instead of Radarr
        #[arg(long)]
        catalog_file: Option<PathBuf>,

        /// Write documents here instead of the configured output_dir
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Classify and build documents without changing any files
        #[arg(long)]
        dry_run: bool,
    },

    /// Show which movies would be treated as upcoming or released
    Preview {
        /// Read movies from a saved JSON movie list instead of Radarr
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },

    /// Show the resolved configuration
    Config,
}

impl Cli {
    /// Load the configuration this invocation asks for.
    ///
    /// `config` shows the defaults when no file exists; the other commands
    /// require one.
    pub fn load_config(&self) -> Result<RunConfig> {
        match self.command {
            Commands::Config => RunConfig::load_or_default(self.config.as_deref()),
            _ => RunConfig::load(self.config.as_deref()),
        }
    }

    /// Execute the CLI command
    pub async fn execute(self, config: RunConfig) -> Result<()> {
        match self.command {
            Commands::Run {
                catalog_file,
                output_dir,
                dry_run,
            } => {
                let config = match output_dir {
                    Some(dir) => config.with_output_dir(dir),
                    None => config,
                };
                match catalog_file {
                    Some(path) => run(config, SnapshotCatalog::from_file(&path)?, dry_run).await,
                    None => {
                        let client = connect(&config).await?;
                        run(config, client, dry_run).await
                    }
                }
            }
            Commands::Preview { catalog_file } => match catalog_file {
                Some(path) => preview(config, SnapshotCatalog::from_file(&path)?).await,
                None => {
                    let client = connect(&config).await?;
                    preview(config, client).await
                }
            },
            Commands::Config => show_config(&config),
        }
    }
}

/// Discover the Radarr API from the configured URL
async fn connect(config: &RunConfig) -> Result<RadarrClient> {
    let url = config
        .radarr_url
        .as_deref()
        .context("radarr_url is not set (config file or RADARR_URL)")?;
    let api_key = config
        .radarr_api_key
        .as_deref()
        .context("radarr_api_key is not set (config file or RADARR_API_KEY)")?;

    RadarrClient::discover(url, api_key).await
}

async fn run<C: CatalogSource>(config: RunConfig, catalog: C, dry_run: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(config, catalog).with_dry_run(dry_run);
    let outcome = orchestrator.run(Utc::now()).await?;

    print_classification(&outcome.classification);
    print_outcome(&outcome);
    Ok(())
}

async fn preview<C: CatalogSource>(config: RunConfig, catalog: C) -> Result<()> {
    let orchestrator = Orchestrator::new(config, catalog);
    let classification = orchestrator.preview(Utc::now()).await?;

    print_classification(&classification);
    println!(
        "\nTotal: {} upcoming, {} released",
        classification.future.len(),
        classification.released.len()
    );
    Ok(())
}

fn movie_line(movie: &ClassifiedMovie) -> String {
    format!(
        "  {:<50} {}  ({})",
        movie.display_title(),
        movie.release_date.format("%Y-%m-%d"),
        movie.release_type
    )
}

fn print_classification(classification: &Classification) {
    println!("Upcoming movies ({}):", classification.future.len());
    if classification.future.is_empty() {
        println!("  (none)");
    }
    for movie in &classification.future {
        println!("{}", movie_line(movie));
    }

    println!("\nReleased but not downloaded ({}):", classification.released.len());
    if classification.released.is_empty() {
        println!("  (none)");
    }
    for movie in &classification.released {
        println!("{}", movie_line(movie));
    }
}

fn print_cleanup(report: &CleanupReport) {
    if report.removed.is_empty() {
        return;
    }
    println!("\nRemoved placeholders:");
    for removal in &report.removed {
        println!(
            "  {:<50} {}  ({:.1} MB)",
            removal.title,
            removal.reason,
            removal.bytes as f64 / (1024.0 * 1024.0)
        );
    }
}

fn print_outcome(outcome: &RunOutcome) {
    let summary = &outcome.summary;

    if let Some(report) = &outcome.cleanup {
        print_cleanup(report);
    }

    let failures = outcome
        .create_failures
        .iter()
        .chain(outcome.cleanup.iter().flat_map(|r| r.failures.iter()));
    let mut printed_header = false;
    for failure in failures {
        if !printed_header {
            println!("\nFailures:");
            printed_header = true;
        }
        println!("  {}", failure);
    }

    println!();
    println!("Summary{}:", if summary.dry_run { " (dry run)" } else { "" });
    println!("  Upcoming:              {}", summary.future);
    println!("  Released:              {}", summary.released);
    println!("  Placeholders created:  {}", summary.created);
    println!("  Already present:       {}", summary.already_present);
    if summary.cleanup_ran {
        println!("  Placeholders checked:  {}", summary.checked);
        println!("  Placeholders removed:  {}", summary.removed);
        println!(
            "  Space reclaimed:       {:.1} MB",
            summary.bytes_reclaimed as f64 / (1024.0 * 1024.0)
        );
    }
    println!("  Failures:              {}", summary.failures());
    println!("  Elapsed:               {}", summary.elapsed_hms());

    for path in &outcome.written {
        println!("  Wrote {}", path.display());
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &RunConfig) -> Result<()> {
    let key_state = match &config.radarr_api_key {
        Some(key) if !key.is_empty() => "(set)",
        _ => "(not set)",
    };

    println!("comingsoon configuration");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_deref()
            .map(display_path)
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Radarr:");
    println!("  URL:     {}", config.radarr_url.as_deref().unwrap_or("(not set)"));
    println!("  API key: {}", key_state);
    println!();
    println!("Classification:");
    println!("  Horizon:            {} days", config.classify.horizon_days);
    println!("  UTC offset:         {} h", config.classify.utc_offset_hours);
    println!("  Future only:        {}", config.classify.future_only);
    println!("  Include in cinemas: {}", config.classify.include_in_cinemas);
    println!();
    println!("Placeholders:");
    println!("  Video:   {}/{}.*", config.placeholder_dir.display(), config.placeholder_stem);
    println!("  Cleanup: {}", config.cleanup);
    println!();
    println!("Path mapping:");
    if config.path_mapper.is_empty() {
        println!("  (none)");
    }
    for rule in config.path_mapper.rules() {
        println!("  {} -> {}", rule.from, rule.to);
    }
    println!();
    println!("Output directory: {}", config.output_dir.display());

    Ok(())
}
