//! Reshape gateway rows into response records.
//!
//! Knowledge-base rows carry their movie attributes as a JSON document in the
//! `metadata` column. A row whose metadata cannot be read still produces a
//! result, with default fields.

use serde_json::{Map, Value};
use tracing::warn;

use plotrix_core::types::{EnrichResult, InsightResult, RawRow, RowSet, SearchResult};

use crate::error::QueryError;

/// Decode the `metadata` column into a JSON object.
///
/// Accepts a JSON-encoded string or an already-decoded object. Anything else
/// yields an empty object.
pub fn parse_metadata(row: &RawRow) -> Map<String, Value> {
    match row.get("metadata") {
        None => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(metadata = %raw, kind = json_kind(&other), "Metadata is not an object");
                Map::new()
            }
            Err(e) => {
                warn!(metadata = %raw, error = %e, "Bad metadata");
                Map::new()
            }
        },
        Some(other) => {
            warn!(metadata = %other, "Bad metadata");
            Map::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text_field(meta: &Map<String, Value>, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Coerce a release year from metadata into a non-negative integer.
pub fn coerce_year(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).ok()
            } else if let Some(f) = n.as_f64() {
                float_year(f)
            } else {
                None
            }
        }
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_year))
        }
        _ => None,
    }
}

fn float_year(f: f64) -> Option<u32> {
    if !f.is_finite() || f < 0.0 || f > u32::MAX as f64 {
        return None;
    }
    Some(f.trunc() as u32)
}

fn coerce_relevance(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Build a search hit from one knowledge-base row. `poster_url` is left
/// empty for the caller to fill.
pub fn normalize_search_row(row: &RawRow) -> SearchResult {
    let meta = parse_metadata(row);

    SearchResult {
        title: text_field(&meta, "title").unwrap_or_else(|| "Unknown".to_string()),
        origin: text_field(&meta, "origin").filter(|o| !o.trim().is_empty()),
        genre: text_field(&meta, "genre").unwrap_or_default(),
        release_year: meta.get("release_year").and_then(coerce_year),
        snippet: row.get_text("chunk_content").unwrap_or_default(),
        relevance: coerce_relevance(row.get("relevance")),
        poster_url: None,
    }
}

fn first_column(rows: &RowSet, column: &str, not_found: &str) -> Result<String, QueryError> {
    let row = rows
        .first()
        .ok_or_else(|| QueryError::NotFound(not_found.to_string()))?;
    row.get_text(column).ok_or_else(|| {
        QueryError::Gateway(format!("Query result is missing the '{}' column", column))
    })
}

/// Extract the answer from a Q&A model result.
pub fn normalize_insight_rows(rows: &RowSet) -> Result<InsightResult, QueryError> {
    let answer = first_column(rows, "answer", "No answer found")?;
    Ok(InsightResult { answer })
}

/// Extract the response from a metadata-enrichment model result.
pub fn normalize_enrich_rows(rows: &RowSet) -> Result<EnrichResult, QueryError> {
    let response = first_column(rows, "response", "No enriched metadata found")?;
    Ok(EnrichResult { response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noir_row() -> RawRow {
        RawRow::new()
            .with(
                "metadata",
                r#"{"title":"Noir City","release_year":1995,"origin":"USA","genre":"Crime"}"#,
            )
            .with("chunk_content", "A detective unravels...")
            .with("relevance", 0.87)
    }

    #[test]
    fn test_normalize_full_row() {
        let result = normalize_search_row(&noir_row());
        assert_eq!(result.title, "Noir City");
        assert_eq!(result.origin.as_deref(), Some("USA"));
        assert_eq!(result.genre, "Crime");
        assert_eq!(result.release_year, Some(1995));
        assert_eq!(result.snippet, "A detective unravels...");
        assert!((result.relevance - 0.87).abs() < f64::EPSILON);
        assert_eq!(result.poster_url, None);
    }

    #[test]
    fn test_malformed_metadata_yields_defaults() {
        let row = RawRow::new()
            .with("metadata", "{not valid json")
            .with("chunk_content", "text")
            .with("relevance", 0.5);
        let result = normalize_search_row(&row);
        assert_eq!(result.title, "Unknown");
        assert_eq!(result.genre, "");
        assert_eq!(result.origin, None);
        assert_eq!(result.release_year, None);
        assert_eq!(result.snippet, "text");
    }

    #[test]
    fn test_missing_columns_yield_defaults() {
        let result = normalize_search_row(&RawRow::new());
        assert_eq!(result.title, "Unknown");
        assert_eq!(result.snippet, "");
        assert_eq!(result.relevance, 0.0);
    }

    #[test]
    fn test_metadata_non_object_is_empty() {
        let row = RawRow::new().with("metadata", "[1, 2, 3]");
        assert!(parse_metadata(&row).is_empty());

        let row = RawRow::new().with("metadata", Value::Null);
        assert!(parse_metadata(&row).is_empty());
    }

    #[test]
    fn test_metadata_already_decoded_object() {
        let row = RawRow::new().with("metadata", json!({"title": "Heat", "release_year": "1995"}));
        let result = normalize_search_row(&row);
        assert_eq!(result.title, "Heat");
        assert_eq!(result.release_year, Some(1995));
    }

    #[test]
    fn test_null_release_year_absent() {
        let row = RawRow::new().with("metadata", r#"{"title":"X","release_year":null}"#);
        assert_eq!(normalize_search_row(&row).release_year, None);
    }

    #[test]
    fn test_coerce_year() {
        assert_eq!(coerce_year(&json!(1995)), Some(1995));
        assert_eq!(coerce_year(&json!(1995.0)), Some(1995));
        assert_eq!(coerce_year(&json!(1995.9)), Some(1995));
        assert_eq!(coerce_year(&json!("2001")), Some(2001));
        assert_eq!(coerce_year(&json!(" 2001.0 ")), Some(2001));
        assert_eq!(coerce_year(&json!(-5)), None);
        assert_eq!(coerce_year(&json!("-5")), None);
        assert_eq!(coerce_year(&json!("nineteen")), None);
        assert_eq!(coerce_year(&json!(true)), None);
        assert_eq!(coerce_year(&Value::Null), None);
    }

    #[test]
    fn test_relevance_coercion() {
        let row = RawRow::new().with("relevance", "0.25");
        assert_eq!(normalize_search_row(&row).relevance, 0.25);

        let row = RawRow::new().with("relevance", "high");
        assert_eq!(normalize_search_row(&row).relevance, 0.0);

        let row = RawRow::new().with("relevance", 3);
        assert_eq!(normalize_search_row(&row).relevance, 3.0);
    }

    #[test]
    fn test_blank_origin_absent() {
        let row = RawRow::new().with("metadata", r#"{"origin":""}"#);
        assert_eq!(normalize_search_row(&row).origin, None);
    }

    #[test]
    fn test_insight_first_row() {
        let rows = vec![
            RawRow::new().with("answer", "Vincent Hanna"),
            RawRow::new().with("answer", "ignored"),
        ];
        assert_eq!(normalize_insight_rows(&rows).unwrap().answer, "Vincent Hanna");
    }

    #[test]
    fn test_empty_rows_not_found() {
        let rows: RowSet = Vec::new();
        assert!(matches!(
            normalize_insight_rows(&rows),
            Err(QueryError::NotFound(ref m)) if m == "No answer found"
        ));
        assert!(matches!(
            normalize_enrich_rows(&rows),
            Err(QueryError::NotFound(ref m)) if m == "No enriched metadata found"
        ));
    }

    #[test]
    fn test_missing_column_is_service_error() {
        let rows = vec![RawRow::new().with("other", "x")];
        assert!(matches!(
            normalize_enrich_rows(&rows),
            Err(QueryError::Gateway(_))
        ));
    }

    #[test]
    fn test_enrich_first_row() {
        let rows = vec![RawRow::new().with("response", "Director: Michael Mann")];
        assert_eq!(
            normalize_enrich_rows(&rows).unwrap().response,
            "Director: Michael Mann"
        );
    }
}
