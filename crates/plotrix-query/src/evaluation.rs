//! Retrieval evaluation against a labelled prompt set.
//!
//! Each prompt carries the id of the document it was written from. The
//! prompt is run as a content search and the rank of that document among
//! the returned chunks is recorded. Prompts are read from CSV
//! (`id,level,content`) and the per-prompt records are written back as CSV
//! in [`REPORT_COLUMNS`] order.

use std::io::{Read, Write};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::info;

use plotrix_core::error::{PlotrixError, Result as CoreResult};
use plotrix_core::types::RowSet;

use crate::normalize::parse_metadata;
use crate::service::MovieService;

/// Default number of rows retrieved per prompt.
pub const DEFAULT_EVAL_LIMIT: u32 = 10;

/// Header of the per-prompt CSV report.
pub const REPORT_COLUMNS: [&str; 8] = [
    "id",
    "level",
    "query",
    "response_time_sec",
    "found_top_1",
    "found_top_5",
    "found_top_10",
    "match_position",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalPrompt {
    pub id: i64,
    pub level: String,
    pub content: String,
}

/// Where the expected document landed for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPosition {
    Found(usize),
    NotFound,
    Error(String),
}

impl MatchPosition {
    fn within(&self, k: usize) -> bool {
        matches!(self, MatchPosition::Found(pos) if *pos < k)
    }
}

impl Serialize for MatchPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MatchPosition::Found(pos) => serializer.serialize_u64(*pos as u64),
            MatchPosition::NotFound => serializer.serialize_str("Not Found"),
            MatchPosition::Error(msg) => serializer.serialize_str(&format!("Error: {}", msg)),
        }
    }
}

/// One report row. Field order matches [`REPORT_COLUMNS`].
#[derive(Debug, Clone, Serialize)]
pub struct EvalRecord {
    pub id: i64,
    pub level: String,
    pub query: String,
    pub response_time_sec: Option<f64>,
    pub found_top_1: bool,
    pub found_top_5: bool,
    pub found_top_10: bool,
    pub match_position: MatchPosition,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub total: usize,
    pub errors: usize,
    pub hit_rate_top_1: f64,
    pub hit_rate_top_5: f64,
    pub hit_rate_top_10: f64,
    pub mean_response_time_sec: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub limit: u32,
    pub summary: EvalSummary,
    pub results: Vec<EvalRecord>,
}

fn csv_error(err: csv::Error) -> PlotrixError {
    PlotrixError::Serialization(err.to_string())
}

/// Read prompts from CSV with an `id,level,content` header. Extra columns
/// are ignored and column order does not matter.
pub fn read_prompts<R: Read>(reader: R) -> CoreResult<Vec<EvalPrompt>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    reader
        .deserialize()
        .collect::<Result<Vec<EvalPrompt>, _>>()
        .map_err(csv_error)
}

/// Write per-prompt records as CSV. The header is written even when there
/// are no records.
pub fn write_records<W: Write>(writer: W, records: &[EvalRecord]) -> CoreResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(REPORT_COLUMNS).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Source document id of a knowledge-base row, rendered as text.
fn original_doc_id(meta: &serde_json::Map<String, Value>) -> String {
    match meta.get("original_doc_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Zero-based rank of the row whose source document is `id`.
pub fn match_position(rows: &RowSet, id: i64) -> Option<usize> {
    let wanted = id.to_string();
    rows.iter()
        .map(|row| original_doc_id(&parse_metadata(row)))
        .position(|doc_id| doc_id == wanted)
}

fn round4(secs: f64) -> f64 {
    (secs * 10_000.0).round() / 10_000.0
}

/// Evaluate a single prompt. Gateway failures and timeouts become an error
/// record.
pub async fn evaluate_prompt(
    service: &MovieService,
    prompt: &EvalPrompt,
    limit: u32,
) -> EvalRecord {
    let sql = service.builder().build_content_search(&prompt.content, limit);
    let started = Instant::now();

    let (response_time_sec, position) = match service.run("evaluate", &sql).await {
        Ok(rows) => {
            let elapsed = round4(started.elapsed().as_secs_f64());
            let position = match match_position(&rows, prompt.id) {
                Some(pos) => MatchPosition::Found(pos),
                None => MatchPosition::NotFound,
            };
            (Some(elapsed), position)
        }
        Err(e) => (None, MatchPosition::Error(e.to_string())),
    };

    EvalRecord {
        id: prompt.id,
        level: prompt.level.clone(),
        query: prompt.content.clone(),
        response_time_sec,
        found_top_1: position.within(1),
        found_top_5: position.within(5),
        found_top_10: position.within(10),
        match_position: position,
    }
}

/// Run every prompt sequentially and summarize.
pub async fn evaluate(service: &MovieService, prompts: &[EvalPrompt], limit: u32) -> EvalReport {
    let limit = limit.max(1);
    let mut results = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        results.push(evaluate_prompt(service, prompt, limit).await);
    }

    let summary = summarize(&results);
    info!(
        total = summary.total,
        errors = summary.errors,
        top_1 = summary.hit_rate_top_1,
        top_10 = summary.hit_rate_top_10,
        "Evaluation completed"
    );

    EvalReport {
        generated_at: Utc::now(),
        limit,
        summary,
        results,
    }
}

pub fn summarize(records: &[EvalRecord]) -> EvalSummary {
    let total = records.len();
    let rate = |hits: usize| {
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    };
    let timings: Vec<f64> = records.iter().filter_map(|r| r.response_time_sec).collect();

    EvalSummary {
        total,
        errors: records
            .iter()
            .filter(|r| matches!(r.match_position, MatchPosition::Error(_)))
            .count(),
        hit_rate_top_1: rate(records.iter().filter(|r| r.found_top_1).count()),
        hit_rate_top_5: rate(records.iter().filter(|r| r.found_top_5).count()),
        hit_rate_top_10: rate(records.iter().filter(|r| r.found_top_10).count()),
        mean_response_time_sec: if timings.is_empty() {
            None
        } else {
            Some(round4(timings.iter().sum::<f64>() / timings.len() as f64))
        },
    }
}
