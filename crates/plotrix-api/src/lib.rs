//! Plotrix API crate - axum HTTP server and route handlers.
//!
//! Exposes movie search, question answering, metadata enrichment, poster
//! lookup and health endpoints over the query layer in `plotrix-query`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
