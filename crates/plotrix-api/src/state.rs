//! Application state shared across all route handlers.
//!
//! AppState is the explicit context handle threaded through every handler
//! via axum's State extractor. It is built once at startup and never
//! mutated afterwards.

use std::sync::Arc;
use std::time::Instant;

use plotrix_core::config::PlotrixConfig;
use plotrix_query::MovieService;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<PlotrixConfig>,
    /// Query layer: builder, gateway handle and poster lookup.
    pub service: Arc<MovieService>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: PlotrixConfig, service: MovieService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            start_time: Instant::now(),
        }
    }
}
