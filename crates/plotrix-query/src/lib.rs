//! Query construction and result normalization for the Plotrix service.
//!
//! Turns typed movie requests into MindsDB SQL, executes them through a
//! [`QueryGateway`], reshapes the returned rows into response records and
//! decorates search hits with best-effort poster artwork.

pub mod builder;
pub mod error;
pub mod escape;
pub mod evaluation;
pub mod gateway;
pub mod normalize;
pub mod poster;
pub mod service;

pub use builder::{QueryBuilder, WhereClause};
pub use error::QueryError;
pub use escape::escape_literal;
pub use gateway::{MindsDbGateway, QueryGateway};
pub use poster::{poster_or_none, NoPosterLookup, PosterLookup, TmdbPosterLookup};
pub use service::MovieService;
