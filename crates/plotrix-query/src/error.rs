//! Error taxonomy for the query layer.
//!
//! Malformed row metadata and poster failures are recovered where they
//! happen and therefore have no variant here.

use plotrix_core::error::PlotrixError;

/// Errors surfaced by [`crate::MovieService`] operations.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("gateway timed out after {0}s")]
    Timeout(u64),
}

impl From<PlotrixError> for QueryError {
    fn from(err: PlotrixError) -> Self {
        match err {
            PlotrixError::Validation(msg) => QueryError::Validation(msg),
            PlotrixError::Gateway(msg) => QueryError::Gateway(msg),
            other => QueryError::Gateway(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::Gateway(err.to_string())
    }
}
