//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression and the
//! movie endpoints.

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use plotrix_core::config::GeneralConfig;
use plotrix_core::error::PlotrixError;

use crate::handlers;
use crate::state::AppState;

/// CORS policy: the configured origin list, or any origin when it is empty.
fn cors_layer(general: &GeneralConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = general
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.general);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/search_movies", post(handlers::search_movies))
        .route("/movie_insights", post(handlers::movie_insights))
        .route("/movie_metadata", post(handlers::movie_metadata))
        .route("/movie_poster/{title}", get(handlers::movie_poster))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API on the configured host and port until `shutdown` resolves.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), PlotrixError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.general.host, state.config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PlotrixError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PlotrixError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}
