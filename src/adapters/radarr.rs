//! Radarr HTTP client.
//!
//! The configured URL may carry a path (or be behind a `/radarr` reverse
//! proxy prefix), so the API root is discovered by probing the health
//! endpoint under each known prefix.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::CatalogSource;
use crate::domain::CatalogEntry;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API prefixes tried in order
const API_PATHS: &[&str] = &["/api/v3", "/radarr/api/v3"];

/// Radarr v3 API client
pub struct RadarrClient {
    /// Discovered API root, e.g. `http://host:7878/api/v3`
    api_url: String,

    /// API key sent as `X-Api-Key`
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl RadarrClient {
    /// Create a client for a known API root (no discovery)
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Find the API root behind `url` and return a client for it
    pub async fn discover(url: &str, api_key: &str) -> Result<Self> {
        let base = base_url(url);
        let candidates = api_candidates(&base);

        for candidate in &candidates {
            let client = Self::new(candidate.as_str(), api_key)?;
            match client.health_check().await {
                Ok(()) => {
                    info!(api = %candidate, "Connected to Radarr");
                    return Ok(client);
                }
                Err(e) => {
                    warn!(api = %candidate, error = %e, "Radarr API root not reachable");
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::bail!(
            "Unable to connect to Radarr. Tried the following URLs:\n{}\n\
             Check the URL and API key and that Radarr is running.",
            tried
        )
    }

    /// The API root in use
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}

#[async_trait]
impl CatalogSource for RadarrClient {
    fn name(&self) -> &str {
        "radarr"
    }

    async fn health_check(&self) -> Result<()> {
        let url = self.endpoint("health");
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        // Only a plain 200 counts; redirects to a login page do not
        if response.status() != reqwest::StatusCode::OK {
            anyhow::bail!("{} returned HTTP {}", url, response.status());
        }
        Ok(())
    }

    async fn fetch_movies(&self) -> Result<Vec<CatalogEntry>> {
        let url = self.endpoint("movie");
        debug!(%url, "Fetching movies");

        let movies: Vec<CatalogEntry> = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()
            .context("Radarr rejected the movie request")?
            .json()
            .await
            .context("Failed to parse Radarr movie list")?;

        info!(count = movies.len(), "Fetched movies from Radarr");
        Ok(movies)
    }
}

/// Strip any path (and trailing slash) from a configured URL
fn base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    match url.find("://") {
        Some(scheme_end) => {
            let host_start = scheme_end + 3;
            match url[host_start..].find('/') {
                Some(slash) => url[..host_start + slash].to_string(),
                None => url.to_string(),
            }
        }
        None => url.to_string(),
    }
}

fn api_candidates(base: &str) -> Vec<String> {
    API_PATHS.iter().map(|path| format!("{}{}", base, path)).collect()
}
