use thiserror::Error;

/// Top-level error type for the Plotrix service.
///
/// Subsystem crates define their own error types and convert to and from
/// `PlotrixError` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlotrixError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Poster lookup error: {0}")]
    Poster(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PlotrixError {
    fn from(err: toml::de::Error) -> Self {
        PlotrixError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PlotrixError {
    fn from(err: serde_json::Error) -> Self {
        PlotrixError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Plotrix operations.
pub type Result<T> = std::result::Result<T, PlotrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(PlotrixError, &str)> = vec![
            (
                PlotrixError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                PlotrixError::Validation("query must not be empty".to_string()),
                "Validation error: query must not be empty",
            ),
            (
                PlotrixError::Gateway("connection refused".to_string()),
                "Gateway error: connection refused",
            ),
            (
                PlotrixError::Poster("status 401".to_string()),
                "Poster lookup error: status 401",
            ),
            (
                PlotrixError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                PlotrixError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlotrixError = io_err.into();
        assert!(matches!(err, PlotrixError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let plotrix_err: PlotrixError = err.unwrap_err().into();
        assert!(matches!(plotrix_err, PlotrixError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let plotrix_err: PlotrixError = err.unwrap_err().into();
        assert!(matches!(plotrix_err, PlotrixError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let parsed: serde_json::Value = serde_json::from_str("{\"a\": 1}")?;
            Ok(parsed["a"].to_string())
        }

        assert_eq!(inner().unwrap(), "1");
    }
}
