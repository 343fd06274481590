//! CLI argument definitions for the Plotrix application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use plotrix_core::config::PlotrixConfig;
use plotrix_query::evaluation::DEFAULT_EVAL_LIMIT;

/// Plotrix: movie search, Q&A and metadata enrichment over MindsDB.
#[derive(Parser, Debug)]
#[command(name = "plotrix", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Interface to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Measure retrieval quality against a labelled prompt file.
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EvaluateArgs {
    /// CSV prompt file with an `id,level,content` header.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Where to write the per-prompt CSV results.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Also write the full report with hit rates as JSON.
    #[arg(long = "summary")]
    pub summary: Option<PathBuf>,
    /// Rows retrieved per prompt.
    #[arg(long = "limit", default_value_t = DEFAULT_EVAL_LIMIT)]
    pub limit: u32,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PLOTRIX_CONFIG env var > platform default (~/.plotrix/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PLOTRIX_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply flag overrides on top of a config that already carries file and
    /// environment values.
    pub fn apply_overrides(&self, config: &mut PlotrixConfig) {
        if let Some(port) = self.port {
            config.general.port = port;
        }
        if let Some(ref host) = self.host {
            config.general.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".plotrix").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".plotrix").join("config.toml");
    }
    PathBuf::from("config.toml")
}
