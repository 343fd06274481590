//! SQL text construction for the three MindsDB operations.
//!
//! MindsDB's HTTP endpoint only accepts literal SQL, so every user-supplied
//! string goes through [`escape_literal`] on its way into a filter. Integer
//! filters are rendered directly from their typed value.

use std::fmt;

use plotrix_core::config::GatewayConfig;
use plotrix_core::types::{EnrichRequest, InsightRequest, SearchRequest};

use crate::escape::escape_literal;

/// Conjunction of equality filters, rendered in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    filters: Vec<String>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = '<escaped value>'`
    pub fn eq_text(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push(format!("{} = '{}'", column, escape_literal(value)));
        self
    }

    /// `column = <n>`
    pub fn eq_int(mut self, column: &str, value: impl Into<i64>) -> Self {
        self.filters.push(format!("{} = {}", column, value.into()));
        self
    }

    pub fn eq_text_opt(self, column: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq_text(column, v),
            None => self,
        }
    }

    pub fn eq_int_opt(self, column: &str, value: Option<u32>) -> Self {
        match value {
            Some(v) => self.eq_int(column, v),
            None => self,
        }
    }

}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filters.join(" AND "))
    }
}

/// Builds the SQL sent to the query gateway.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    search_table: String,
    insight_model: String,
    enrich_model: String,
    search_limit: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

impl QueryBuilder {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            search_table: config.search_table.clone(),
            insight_model: config.insight_model.clone(),
            enrich_model: config.enrich_model.clone(),
            search_limit: config.search_limit.max(1),
        }
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit
    }

    /// Semantic search over the knowledge base.
    ///
    /// The optional origin and release-year filters are appended in that
    /// order, and only when present. A blank origin or a year of 0 counts as
    /// absent.
    pub fn build_search(&self, req: &SearchRequest) -> String {
        let clause = WhereClause::new()
            .eq_text("content", &req.query)
            .eq_text_opt("origin", req.origin_filter())
            .eq_int_opt("release_year", req.year_filter());
        format!(
            "SELECT * FROM {} WHERE {} LIMIT {};",
            self.search_table, clause, self.search_limit
        )
    }

    /// Content-only search with a caller-chosen limit, used by retrieval
    /// evaluation.
    pub fn build_content_search(&self, content: &str, limit: u32) -> String {
        let clause = WhereClause::new().eq_text("content", content);
        format!(
            "SELECT * FROM {} WHERE {} LIMIT {};",
            self.search_table, clause, limit
        )
    }

    /// Question answering about a single movie. Selects the `answer` column.
    pub fn build_insight(&self, req: &InsightRequest) -> String {
        let clause = WhereClause::new()
            .eq_text("title", &req.title)
            .eq_text("plot", &req.plot)
            .eq_text("origin", &req.origin)
            .eq_int("release_year", req.release_year)
            .eq_text("question", &req.question);
        format!("SELECT answer FROM {} WHERE {};", self.insight_model, clause)
    }

    /// Metadata enrichment for a single movie. Selects the `response` column.
    pub fn build_enrich(&self, req: &EnrichRequest) -> String {
        let clause = WhereClause::new()
            .eq_text("title", &req.title)
            .eq_text("plot", &req.plot)
            .eq_text("genre", &req.genre)
            .eq_text("origin", &req.origin)
            .eq_int("release_year", req.release_year);
        format!("SELECT response FROM {} WHERE {};", self.enrich_model, clause)
    }
}
