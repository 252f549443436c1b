//! Executor output and the rendered response handed back to callers.

use serde::Serialize;

use crate::query::{AggregationFunction, AggregationTarget};
use crate::types::Record;

/// Where a row set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrigin {
    /// Rows matched the structured filter predicates.
    Structured,
    /// The filter matched nothing and rows were retrieved by vector
    /// similarity to the original query text. Each row carries a
    /// `similarity_score` column.
    Vector,
}

/// Result of executing one structured query. One variant per result shape.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Matching records, untruncated.
    RowSet { rows: Vec<Record>, origin: RowOrigin },
    /// A generic aggregation. `value` is `None` when nothing could be
    /// aggregated.
    ScalarAggregate {
        function: AggregationFunction,
        target: AggregationTarget,
        value: Option<f64>,
        records_used: usize,
    },
    /// Local-authority area with the highest average crime score.
    AreaRanking { area: String, average_crime_score: f64 },
    /// Average studio price against average two-bedroom price.
    PriceComparison { studio_avg_price: f64, two_bed_avg_price: f64, difference: f64 },
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::RowSet { rows, .. } => rows.len(),
            _ => 1,
        }
    }
}

/// Narrative plus preview and full tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedResponse {
    pub narrative: String,
    pub preview: Vec<Record>,
    pub full: Vec<Record>,
}

impl RenderedResponse {
    pub fn new(narrative: impl Into<String>, preview: Vec<Record>, full: Vec<Record>) -> Self {
        Self { narrative: narrative.into(), preview, full }
    }

    /// A narrative with two empty tables.
    pub fn message(narrative: impl Into<String>) -> Self {
        Self::new(narrative, Vec::new(), Vec::new())
    }

    /// A single-row result shown identically in both tables.
    pub fn single_row(narrative: impl Into<String>, row: Record) -> Self {
        Self::new(narrative, vec![row.clone()], vec![row])
    }

    pub fn into_parts(self) -> (String, Vec<Record>, Vec<Record>) {
        (self.narrative, self.preview, self.full)
    }
}

/// Caller-facing body: `results` falls back to the preview when the full
/// table is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub preview: Vec<Record>,
    pub results: Vec<Record>,
}

impl From<RenderedResponse> for QueryResponse {
    fn from(rendered: RenderedResponse) -> Self {
        let results = if rendered.full.is_empty() { rendered.preview.clone() } else { rendered.full };
        Self { response: rendered.narrative, preview: rendered.preview, results }
    }
}
