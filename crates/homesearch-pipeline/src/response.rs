//! Renders a [`QueryResult`] into a narrative plus preview and full tables.
//! Pure: the same inputs always give the same output.

use homesearch_core::query::{AggregationFunction, AggregationTarget, StructuredQuery};
use homesearch_core::result::{QueryResult, RenderedResponse, RowOrigin};
use homesearch_core::schema;
use homesearch_core::types::Record;
use tracing::debug;

use crate::executor::round2;

pub const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ResponseGenerator {
    preview_rows: usize,
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_ROWS)
    }
}

impl ResponseGenerator {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows: preview_rows.max(1) }
    }

    pub fn render(&self, query_text: &str, query: &StructuredQuery, result: &QueryResult) -> RenderedResponse {
        debug!(category = %query.category(), rows = result.row_count(), "rendering response");
        match result {
            QueryResult::AreaRanking { area, average_crime_score } => {
                let score = round2(*average_crime_score);
                RenderedResponse::single_row(
                    format!("The area with the most crime is **{area}** (avg score {score:.2})."),
                    Record::new().with("Area", area.as_str()).with("Avg Crime Score", score),
                )
            }
            QueryResult::PriceComparison { studio_avg_price, two_bed_avg_price, difference } => {
                RenderedResponse::single_row(
                    format!(
                        "The **average price** of studio homes is **${studio_avg_price:.2}**, \
                         while 2-bedroom homes average **${two_bed_avg_price:.2}**. \
                         The difference is about **${difference:.2}**."
                    ),
                    Record::new()
                        .with("studio_avg_price", *studio_avg_price)
                        .with("two_bed_avg_price", *two_bed_avg_price)
                        .with("difference", *difference),
                )
            }
            QueryResult::ScalarAggregate { function, target, value, records_used } => {
                render_scalar(*function, *target, *value, *records_used)
            }
            QueryResult::RowSet { rows, origin } => self.render_rows(query_text, rows, *origin),
        }
    }

    fn render_rows(&self, query_text: &str, rows: &[Record], origin: RowOrigin) -> RenderedResponse {
        if rows.is_empty() {
            return RenderedResponse::message("No matching properties found for your query.");
        }

        let full = project_for_display(rows, origin);
        let shown = self.preview_rows.min(full.len());
        let mut narrative = String::new();
        if origin == RowOrigin::Vector {
            narrative.push_str(
                "No listing matched every filter, so these are the closest listings by description. ",
            );
        }
        narrative.push_str(&format!(
            "I found **{} properties** matching your query: '{}'. Here are the top {shown}:",
            full.len(),
            query_text.trim()
        ));
        let preview = full[..shown].to_vec();
        RenderedResponse::new(narrative, preview, full)
    }
}

fn render_scalar(
    function: AggregationFunction,
    target: AggregationTarget,
    value: Option<f64>,
    records_used: usize,
) -> RenderedResponse {
    let name = function.as_str().to_lowercase();
    let Some(value) = value else {
        return RenderedResponse::message(format!("No data available to calculate {name} of {target}."));
    };
    let shown = match function {
        AggregationFunction::Count => format!("{value:.0}"),
        _ => format!("{value:.2}"),
    };
    RenderedResponse::single_row(
        format!("The **{name} {target}** for your query is **{shown}**, based on {records_used} records."),
        Record::new()
            .with("Metric", format!("{function}_{target}"))
            .with("Value", round2(value))
            .with("Records Used", records_used),
    )
}

/// Display columns present in at least one row, in display order; vector
/// matches keep their similarity score. Rows are returned untouched when
/// none of the display columns is present.
fn project_for_display(rows: &[Record], origin: RowOrigin) -> Vec<Record> {
    let mut columns: Vec<&str> = schema::DISPLAY_COLUMNS.to_vec();
    if origin == RowOrigin::Vector {
        columns.push(schema::SIMILARITY_SCORE);
    }
    columns.retain(|c| rows.iter().any(|r| r.contains(c)));
    if columns.iter().all(|c| *c == schema::SIMILARITY_SCORE) {
        return rows.to_vec();
    }
    rows.iter().map(|r| r.project(&columns)).collect()
}
