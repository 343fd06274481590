//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its payload via axum extractors, delegates to the
//! `MovieService` in AppState, and returns JSON. Extractor rejections are
//! turned into 400 responses so malformed bodies never reach the query layer.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use plotrix_core::types::{
    EnrichRequest, EnrichResult, InsightRequest, InsightResult, PosterResponse, SearchRequest,
    SearchResult,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PosterParams {
    pub year: Option<u32>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub gateway_configured: bool,
    pub poster_configured: bool,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /search_movies - semantic search with optional origin/year filters.
pub async fn search_movies(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let Json(request) = payload?;
    let results = state.service.search_movies(&request).await?;
    Ok(Json(results))
}

/// POST /movie_insights - answer a question about one movie.
pub async fn movie_insights(
    State(state): State<AppState>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<InsightResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.service.movie_insights(&request).await?;
    Ok(Json(result))
}

/// POST /movie_metadata - enriched metadata for one movie.
pub async fn movie_metadata(
    State(state): State<AppState>,
    payload: Result<Json<EnrichRequest>, JsonRejection>,
) -> Result<Json<EnrichResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.service.movie_metadata(&request).await?;
    Ok(Json(result))
}

/// GET /movie_poster/{title}?year= - best-effort poster URL, null on miss.
pub async fn movie_poster(
    State(state): State<AppState>,
    title: Result<Path<String>, PathRejection>,
    params: Result<Query<PosterParams>, QueryRejection>,
) -> Result<Json<PosterResponse>, ApiError> {
    let Path(title) = title?;
    let Query(params) = params?;
    let poster_url = state.service.poster(&title, params.year).await;
    Ok(Json(PosterResponse { poster_url }))
}

/// GET /health - liveness plus collaborator wiring.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        gateway_configured: state.service.gateway_configured(),
        poster_configured: state.service.poster_configured(),
    })
}
