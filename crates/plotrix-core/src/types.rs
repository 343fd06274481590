use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PlotrixError, Result};

// =============================================================================
// Requests
// =============================================================================

/// Free-text semantic search over movie plots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub release_year: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            origin: None,
            release_year: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_release_year(mut self, year: u32) -> Self {
        self.release_year = Some(year);
        self
    }

    /// The origin filter, if one was given and is not blank.
    pub fn origin_filter(&self) -> Option<&str> {
        self.origin.as_deref().filter(|o| !o.trim().is_empty())
    }

    /// The release-year filter, if one was given and is non-zero.
    pub fn year_filter(&self) -> Option<u32> {
        self.release_year.filter(|y| *y != 0)
    }

    /// A search needs some text to match against; a blank query is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(PlotrixError::Validation(
                "Field 'query' must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A question about one specific movie.
///
/// Every field is required, but empty strings are forwarded as given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub title: String,
    pub plot: String,
    pub origin: String,
    pub release_year: u32,
    pub question: String,
}

/// Request for enriched metadata about one movie.
///
/// Search hits with no genre carry `""`, which is accepted here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichRequest {
    pub title: String,
    pub plot: String,
    pub genre: String,
    pub origin: String,
    pub release_year: u32,
}

// =============================================================================
// Responses
// =============================================================================

/// One movie matched by a semantic search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub origin: Option<String>,
    pub genre: String,
    pub release_year: Option<u32>,
    pub snippet: String,
    pub relevance: f64,
    pub poster_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightResult {
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichResult {
    pub response: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterResponse {
    pub poster_url: Option<String>,
}

// =============================================================================
// Gateway rows
// =============================================================================

/// One row returned by the query engine, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    columns: Map<String, Value>,
}

/// Ordered rows of one query result.
pub type RowSet = Vec<RawRow>;

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row by pairing column names with values positionally.
    ///
    /// Extra names or values without a partner are ignored.
    pub fn from_columns(names: &[String], values: Vec<Value>) -> Self {
        let columns = names.iter().cloned().zip(values).collect();
        Self { columns }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Column value as text. `null` and missing columns yield `None`;
    /// non-string scalars are rendered with their JSON form.
    pub fn get_text(&self, column: &str) -> Option<String> {
        match self.columns.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_optional_fields_default() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "heist"}"#).unwrap();
        assert_eq!(req.query, "heist");
        assert!(req.origin.is_none());
        assert!(req.release_year.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_search_request_rejects_negative_year() {
        let result: std::result::Result<SearchRequest, _> =
            serde_json::from_str(r#"{"query": "heist", "release_year": -3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_request_blank_query_invalid() {
        let err = SearchRequest::new("   ").validate().unwrap_err();
        assert!(matches!(err, PlotrixError::Validation(_)));
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_origin_filter_ignores_blank() {
        assert_eq!(SearchRequest::new("x").with_origin("  ").origin_filter(), None);
        assert_eq!(
            SearchRequest::new("x").with_origin("Japanese").origin_filter(),
            Some("Japanese")
        );
    }

    #[test]
    fn test_year_filter_ignores_zero() {
        assert_eq!(SearchRequest::new("x").with_release_year(0).year_filter(), None);
        assert_eq!(
            SearchRequest::new("x").with_release_year(1995).year_filter(),
            Some(1995)
        );
        assert_eq!(SearchRequest::new("x").year_filter(), None);
    }

    #[test]
    fn test_insight_request_requires_all_fields() {
        let req: std::result::Result<InsightRequest, _> = serde_json::from_value(json!({
            "title": "Heat", "plot": "p", "origin": "American", "question": "why?"
        }));
        assert!(req.is_err(), "release_year is required");

        let req: InsightRequest = serde_json::from_value(json!({
            "title": "Heat", "plot": "", "origin": "", "release_year": 1995, "question": ""
        }))
        .unwrap();
        assert_eq!(req.question, "");
    }

    #[test]
    fn test_enrich_request_accepts_empty_genre() {
        let req: EnrichRequest = serde_json::from_value(json!({
            "title": "Heat", "plot": "", "genre": "", "origin": "American", "release_year": 1995
        }))
        .unwrap();
        assert_eq!(req.genre, "");

        let missing: std::result::Result<EnrichRequest, _> = serde_json::from_value(json!({
            "title": "Heat", "plot": "p", "origin": "American", "release_year": 1995
        }));
        assert!(missing.is_err(), "genre is required");
    }

    #[test]
    fn test_search_result_serializes_absent_poster_as_null() {
        let result = SearchResult {
            title: "Heat".into(),
            origin: None,
            genre: String::new(),
            release_year: Some(1995),
            snippet: "s".into(),
            relevance: 0.5,
            poster_url: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["poster_url"], Value::Null);
        assert_eq!(value["origin"], Value::Null);
        assert_eq!(value["release_year"], json!(1995));
    }

    #[test]
    fn test_raw_row_from_columns_pairs_positionally() {
        let names = vec!["answer".to_string(), "extra".to_string()];
        let row = RawRow::from_columns(&names, vec![json!("42")]);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get_text("answer").as_deref(), Some("42"));
        assert!(row.get("extra").is_none());
    }

    #[test]
    fn test_raw_row_get_text() {
        let row = RawRow::new()
            .with("s", "text")
            .with("n", 3)
            .with("z", Value::Null);
        assert_eq!(row.get_text("s").as_deref(), Some("text"));
        assert_eq!(row.get_text("n").as_deref(), Some("3"));
        assert_eq!(row.get_text("z"), None);
        assert_eq!(row.get_text("missing"), None);
    }
}
