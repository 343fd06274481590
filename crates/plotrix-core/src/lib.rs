pub mod config;
pub mod error;
pub mod types;

pub use config::PlotrixConfig;
pub use error::{PlotrixError, Result};
pub use types::*;
