use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PlotrixError, Result};

/// Top-level configuration for the Plotrix service.
///
/// Loaded from `~/.plotrix/config.toml` by default. Environment variables
/// override file values for the collaborator wiring (see
/// [`PlotrixConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotrixConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub poster: PosterConfig,
}

impl PlotrixConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlotrixConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// Recognised variables: `MINDSDB_URL`, `MINDSDB_PROJECT`, `TMDB_API_KEY`,
    /// `PLOTRIX_PORT`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MINDSDB_URL").filter(|v| !v.trim().is_empty()) {
            self.gateway.url = url;
        }
        if let Some(project) = lookup("MINDSDB_PROJECT").filter(|v| !v.trim().is_empty()) {
            self.gateway.project = project;
        }
        if let Some(key) = lookup("TMDB_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.poster.api_key = Some(key);
        }
        if let Some(port) = lookup("PLOTRIX_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.general.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid PLOTRIX_PORT"),
            }
        }
    }

    /// Check values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.url.trim().is_empty() {
            return Err(PlotrixError::Config("gateway.url must not be empty".into()));
        }
        if self.gateway.project.trim().is_empty() {
            return Err(PlotrixError::Config(
                "gateway.project must not be empty".into(),
            ));
        }
        if self.gateway.search_limit == 0 {
            return Err(PlotrixError::Config(
                "gateway.search_limit must be at least 1".into(),
            ));
        }
        if self.poster.max_concurrent == 0 {
            return Err(PlotrixError::Config(
                "poster.max_concurrent must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Connection settings for the MindsDB query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the MindsDB HTTP API.
    pub url: String,
    /// Project (database namespace) the queries run in.
    pub project: String,
    /// Upper bound on a single query round trip.
    pub timeout_secs: u64,
    /// Knowledge base holding the chunked movie plots.
    pub search_table: String,
    /// Model answering questions about a movie.
    pub insight_model: String,
    /// Model producing enriched movie metadata.
    pub enrich_model: String,
    /// Maximum rows returned by a semantic search.
    pub search_limit: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:47334".to_string(),
            project: "mindsdb".to_string(),
            timeout_secs: 30,
            search_table: "plotrix_kb".to_string(),
            insight_model: "plotrix_bot".to_string(),
            enrich_model: "movie_info".to_string(),
            search_limit: 4,
        }
    }
}

/// Third-party poster catalog (TMDB) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// API key. Poster enrichment is disabled when absent.
    pub api_key: Option<String>,
    /// Catalog API base URL.
    pub api_url: String,
    /// Prefix joined with the catalog's image path.
    pub image_base_url: String,
    /// Transport timeout for one lookup.
    pub timeout_secs: u64,
    /// Lookups in flight at once for a single search response.
    pub max_concurrent: usize,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            timeout_secs: 10,
            max_concurrent: 4,
        }
    }
}

impl PosterConfig {
    /// Whether a usable API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}
