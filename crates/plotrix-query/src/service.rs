//! Movie operations: build, execute, normalize, decorate.
//!
//! Every operation follows the same path: build the SQL, run it under the
//! gateway deadline, treat an empty result as not found, then reshape the
//! rows. Search additionally rejects a blank query up front, and only search
//! results get poster artwork.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use plotrix_core::config::PlotrixConfig;
use plotrix_core::types::{
    EnrichRequest, EnrichResult, InsightRequest, InsightResult, RowSet, SearchRequest,
    SearchResult,
};

use crate::builder::QueryBuilder;
use crate::error::QueryError;
use crate::gateway::QueryGateway;
use crate::normalize::{normalize_enrich_rows, normalize_insight_rows, normalize_search_row};
use crate::poster::{lookup_all, poster_or_none, PosterLookup};

/// Stateless facade over the query gateway and poster catalog.
///
/// Holds only read-only handles; clone the `Arc` to share across tasks.
pub struct MovieService {
    builder: QueryBuilder,
    gateway: Arc<dyn QueryGateway>,
    posters: Arc<dyn PosterLookup>,
    gateway_timeout: Duration,
    poster_concurrency: usize,
}

impl MovieService {
    pub fn new(
        builder: QueryBuilder,
        gateway: Arc<dyn QueryGateway>,
        posters: Arc<dyn PosterLookup>,
    ) -> Self {
        Self {
            builder,
            gateway,
            posters,
            gateway_timeout: Duration::from_secs(30),
            poster_concurrency: 4,
        }
    }

    /// Build a service with the builder, deadline and concurrency taken from
    /// `config`.
    pub fn from_config(
        config: &PlotrixConfig,
        gateway: Arc<dyn QueryGateway>,
        posters: Arc<dyn PosterLookup>,
    ) -> Self {
        Self::new(QueryBuilder::from_config(&config.gateway), gateway, posters)
            .with_gateway_timeout(Duration::from_secs(config.gateway.timeout_secs.max(1)))
            .with_poster_concurrency(config.poster.max_concurrent)
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn with_poster_concurrency(mut self, max_concurrent: usize) -> Self {
        self.poster_concurrency = max_concurrent.max(1);
        self
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn gateway_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    pub fn poster_configured(&self) -> bool {
        self.posters.is_configured()
    }

    /// Run one query under the gateway deadline. No retry.
    pub async fn run(&self, operation: &str, sql: &str) -> Result<RowSet, QueryError> {
        info!(operation, query = %sql, "Running query");

        let outcome = tokio::time::timeout(self.gateway_timeout, self.gateway.execute(sql)).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(self.gateway_timeout.as_secs())),
        };

        if let Err(ref e) = result {
            error!(operation, error = %e, "{} failed", operation);
        }
        result
    }

    /// Semantic search. Results keep gateway row order.
    pub async fn search_movies(
        &self,
        req: &SearchRequest,
    ) -> Result<Vec<SearchResult>, QueryError> {
        req.validate()?;
        let sql = self.builder.build_search(req);
        let rows = self.run("search_movies", &sql).await?;
        if rows.is_empty() {
            return Err(QueryError::NotFound("No matching movies found".to_string()));
        }

        let mut results: Vec<SearchResult> = rows.iter().map(normalize_search_row).collect();

        let wanted = results
            .iter()
            .map(|r| (r.title.clone(), r.release_year))
            .collect();
        let posters = lookup_all(Arc::clone(&self.posters), wanted, self.poster_concurrency).await;
        for (result, poster) in results.iter_mut().zip(posters) {
            result.poster_url = poster;
        }

        Ok(results)
    }

    /// Question answering about one movie.
    pub async fn movie_insights(&self, req: &InsightRequest) -> Result<InsightResult, QueryError> {
        let sql = self.builder.build_insight(req);
        let rows = self.run("movie_insights", &sql).await?;
        normalize_insight_rows(&rows)
    }

    /// Enriched metadata for one movie.
    pub async fn movie_metadata(&self, req: &EnrichRequest) -> Result<EnrichResult, QueryError> {
        let sql = self.builder.build_enrich(req);
        let rows = self.run("movie_metadata", &sql).await?;
        normalize_enrich_rows(&rows)
    }

    /// Single poster lookup. Never fails.
    pub async fn poster(&self, title: &str, year: Option<u32>) -> Option<String> {
        poster_or_none(self.posters.as_ref(), title, year).await
    }
}
