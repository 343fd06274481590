//! Plotrix application binary - composition root.
//!
//! 1. Parse CLI flags and initialize tracing
//! 2. Resolve configuration (file, env, flags) and apply its log level
//! 3. Open the MindsDB gateway handle and the poster lookup once
//! 4. Serve the axum REST API until Ctrl+C, or run a retrieval evaluation

mod cli;

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use plotrix_api::state::AppState;
use plotrix_core::config::PlotrixConfig;
use plotrix_query::evaluation;
use plotrix_query::{
    MindsDbGateway, MovieService, NoPosterLookup, PosterLookup, QueryGateway, TmdbPosterLookup,
};

use cli::{CliArgs, Command, EvaluateArgs};

/// `RUST_LOG` wins over the configured level.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. The returned handle swaps the filter once
/// the configured log level is known.
fn init_tracing(level: &str) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    handle
}

fn build_poster_lookup(config: &PlotrixConfig) -> Arc<dyn PosterLookup> {
    let key = match config.poster.api_key.as_deref() {
        Some(key) if config.poster.is_enabled() => key,
        _ => {
            tracing::warn!("TMDB_API_KEY not set; poster enrichment disabled");
            return Arc::new(NoPosterLookup);
        }
    };
    match TmdbPosterLookup::new(&config.poster, key) {
        Ok(lookup) => Arc::new(lookup),
        Err(e) => {
            tracing::warn!(error = %e, "Poster client unavailable; poster enrichment disabled");
            Arc::new(NoPosterLookup)
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

async fn serve(
    config: PlotrixConfig,
    gateway: Arc<dyn QueryGateway>,
) -> Result<(), Box<dyn std::error::Error>> {
    let posters = build_poster_lookup(&config);
    let service = MovieService::from_config(&config, gateway, posters);
    let state = AppState::new(config, service);

    plotrix_api::start_server(state, shutdown_signal()).await?;
    Ok(())
}

async fn run_evaluation(
    config: &PlotrixConfig,
    gateway: Arc<dyn QueryGateway>,
    args: &EvaluateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompts = evaluation::read_prompts(File::open(&args.input)?)?;
    tracing::info!(path = %args.input.display(), prompts = prompts.len(), "Evaluation prompts loaded");

    let service = MovieService::from_config(config, gateway, Arc::new(NoPosterLookup));
    let report = evaluation::evaluate(&service, &prompts, args.limit).await;

    create_parent_dir(&args.output)?;
    evaluation::write_records(File::create(&args.output)?, &report.results)?;
    tracing::info!(path = %args.output.display(), "Evaluation results written");

    if let Some(ref summary) = args.summary {
        create_parent_dir(summary)?;
        std::fs::write(summary, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(path = %summary.display(), "Evaluation summary written");
    }
    Ok(())
}

fn create_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let log_handle = init_tracing(args.log_level.as_deref().unwrap_or("info"));
    tracing::info!("Starting Plotrix v{}", env!("CARGO_PKG_VERSION"));

    let config_file = args.resolve_config_path();
    let mut config = if config_file.exists() {
        PlotrixConfig::load(&config_file)?
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file; using defaults");
        PlotrixConfig::default()
    };
    config.apply_env_overrides();
    args.apply_overrides(&mut config);

    if let Err(e) = log_handle.reload(log_filter(&config.general.log_level)) {
        tracing::warn!(error = %e, "Failed to apply configured log level");
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Single long-lived gateway handle, shared read-only by every request.
    let gateway: Arc<dyn QueryGateway> = Arc::new(MindsDbGateway::new(&config.gateway)?);
    tracing::info!(
        url = %config.gateway.url,
        project = %config.gateway.project,
        "MindsDB gateway ready"
    );

    match args.command() {
        Command::Serve => serve(config, gateway).await?,
        Command::Evaluate(eval) => run_evaluation(&config, gateway, &eval).await?,
    }

    tracing::info!("Plotrix stopped");
    Ok(())
}
