//! Resolves a [`StructuredQuery`] against the property store, falling back to
//! vector similarity when structured filters match nothing.
//!
//! Branches, checked in order against the lower-cased original text:
//! 1. "most crime" / "highest crime": area with the highest average crime
//!    score (falls through when no area qualifies);
//! 2. "compare" + "price": studio against two-bedroom average price;
//! 3. aggregation queries: filtered rows aggregated in-process;
//! 4. everything else: filtered rows, or the vector fallback when empty.

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use homesearch_core::error::{Error, Result};
use homesearch_core::query::{
    Aggregation, AggregationFunction, AggregationTarget, NumericField, QueryCategory, StructuredQuery,
};
use homesearch_core::result::{QueryResult, RowOrigin};
use homesearch_core::schema;
use homesearch_core::traits::{Embedder, PropertyStore, VectorIndex};
use homesearch_core::types::Record;

use crate::sql::{self, Statement};

pub const DEFAULT_TOP_K: usize = 20;

pub struct QueryExecutor {
    store: Box<dyn PropertyStore>,
    index: Box<dyn VectorIndex>,
    embedder: Box<dyn Embedder>,
    top_k: usize,
    known_locations: OnceCell<Vec<String>>,
}

impl QueryExecutor {
    pub fn new(store: Box<dyn PropertyStore>, index: Box<dyn VectorIndex>, embedder: Box<dyn Embedder>) -> Self {
        Self { store, index, embedder, top_k: DEFAULT_TOP_K, known_locations: OnceCell::new() }
    }

    /// Depth of the vector fallback.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Distinct addresses in the store, loaded once and cached. A failed load
    /// is not cached.
    pub fn known_locations(&self) -> Result<&[String]> {
        self.known_locations
            .get_or_try_init(|| {
                let locations = self.store.distinct_addresses()?;
                info!(count = locations.len(), "known locations loaded");
                Ok(locations)
            })
            .map(Vec::as_slice)
    }

    pub fn execute(&self, query: &StructuredQuery) -> Result<QueryResult> {
        let text = query.original_text().to_lowercase();

        if text.contains("most crime") || text.contains("highest crime") {
            if let Some(ranking) = self.area_with_most_crime()? {
                return Ok(ranking);
            }
            debug!("no area has a crime score; falling through");
        }

        if text.contains("compare") && text.contains("price") {
            return self.compare_prices();
        }

        if query.category() == QueryCategory::Aggregation {
            return self.aggregate(query);
        }

        self.filter(query)
    }

    fn fetch(&self, statement: &Statement) -> Result<Vec<Record>> {
        self.store.fetch_rows(&statement.sql, &statement.params)
    }

    fn area_with_most_crime(&self) -> Result<Option<QueryResult>> {
        let rows = self.fetch(&sql::area_with_most_crime(self.store.table_name()))?;
        let Some(row) = rows.first() else { return Ok(None) };
        let area = row.get("area").map(ToString::to_string).unwrap_or_default();
        let Some(average) = row.get("avg_crime").and_then(|v| v.as_f64()) else { return Ok(None) };
        info!(branch = "area-most-crime", %area, average, "executed");
        Ok(Some(QueryResult::AreaRanking { area, average_crime_score: average }))
    }

    fn compare_prices(&self) -> Result<QueryResult> {
        let table = self.store.table_name();
        let studio = self.average_price(&sql::studio_average_price(table))?;
        let two_bed = self.average_price(&sql::two_bed_average_price(table))?;
        info!(branch = "compare-prices", studio, two_bed, "executed");
        Ok(QueryResult::PriceComparison {
            studio_avg_price: round2(studio),
            two_bed_avg_price: round2(two_bed),
            difference: round2((studio - two_bed).abs()),
        })
    }

    /// An empty group averages to 0.
    fn average_price(&self, statement: &Statement) -> Result<f64> {
        let rows = self.fetch(statement)?;
        Ok(rows.first().and_then(|r| r.get("avg_price")).and_then(|v| v.as_f64()).unwrap_or(0.0))
    }

    fn aggregate(&self, query: &StructuredQuery) -> Result<QueryResult> {
        let aggregation = query
            .aggregation()
            .unwrap_or_else(|| Aggregation::over(NumericField::Price, AggregationFunction::Avg));
        let rows = self.fetch(&sql::select_matching(self.store.table_name(), query))?;
        let (value, records_used) = compute_aggregate(aggregation, &rows);
        info!(
            branch = "aggregation",
            function = %aggregation.function,
            target = %aggregation.target,
            rows = rows.len(),
            records_used,
            ?value,
            "executed"
        );
        Ok(QueryResult::ScalarAggregate {
            function: aggregation.function,
            target: aggregation.target,
            value,
            records_used,
        })
    }

    fn filter(&self, query: &StructuredQuery) -> Result<QueryResult> {
        let rows = self.fetch(&sql::select_matching(self.store.table_name(), query))?;
        if !rows.is_empty() {
            info!(branch = "filter", rows = rows.len(), "executed");
            return Ok(QueryResult::RowSet { rows, origin: RowOrigin::Structured });
        }
        self.vector_fallback(query.original_text())
    }

    /// Nearest listings to the literal query text, ignoring structured filters.
    fn vector_fallback(&self, text: &str) -> Result<QueryResult> {
        let query_vec = self
            .embedder
            .embed_batch(&[text.to_string()])
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".to_string()))?;

        let hits = self.index.search_vec(&query_vec, self.top_k)?;
        let rows: Vec<Record> = hits
            .into_iter()
            .map(|hit| hit.record.to_record().with(schema::SIMILARITY_SCORE, f64::from(hit.distance)))
            .collect();
        info!(branch = "vector-fallback", rows = rows.len(), top_k = self.top_k, "executed");
        Ok(QueryResult::RowSet { rows, origin: RowOrigin::Vector })
    }
}

/// Aggregate over `rows` in-process.
///
/// The wildcard target counts rows. A field target only considers rows whose
/// value is numeric. Returns the value, absent when nothing could be
/// aggregated, and the number of records that contributed.
pub fn compute_aggregate(aggregation: Aggregation, rows: &[Record]) -> (Option<f64>, usize) {
    let column = match aggregation.target {
        AggregationTarget::AllRows => {
            let value = match aggregation.function {
                AggregationFunction::Count if !rows.is_empty() => Some(rows.len() as f64),
                _ => None,
            };
            return (value, rows.len());
        }
        AggregationTarget::Field(field) => field.column(),
    };

    let values: Vec<f64> = rows.iter().filter_map(|r| r.get(column).and_then(|v| v.as_f64())).collect();
    if values.is_empty() {
        return (None, 0);
    }
    let value = match aggregation.function {
        AggregationFunction::Count => Some(values.len() as f64),
        AggregationFunction::Sum => Some(values.iter().sum()),
        AggregationFunction::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
        AggregationFunction::Min => values.iter().copied().reduce(f64::min),
        AggregationFunction::Max => values.iter().copied().reduce(f64::max),
        AggregationFunction::Compare => None,
    };
    (value, values.len())
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use homesearch_core::types::Value;

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("price", 100.0).with("bedrooms", 2i64),
            Record::new().with("price", 300.0).with("bedrooms", Value::Null),
            Record::new().with("price", "n/a").with("bedrooms", 4i64),
        ]
    }

    #[test]
    fn numeric_functions_skip_missing_values() {
        let avg = Aggregation::over(NumericField::Price, AggregationFunction::Avg);
        assert_eq!(compute_aggregate(avg, &rows()), (Some(200.0), 2));
        let max = Aggregation::over(NumericField::Bedrooms, AggregationFunction::Max);
        assert_eq!(compute_aggregate(max, &rows()), (Some(4.0), 2));
        let min = Aggregation::over(NumericField::Price, AggregationFunction::Min);
        assert_eq!(compute_aggregate(min, &rows()), (Some(100.0), 2));
        let sum = Aggregation::over(NumericField::Price, AggregationFunction::Sum);
        assert_eq!(compute_aggregate(sum, &rows()), (Some(400.0), 2));
    }

    #[test]
    fn wildcard_count_counts_rows() {
        assert_eq!(compute_aggregate(Aggregation::count(), &rows()), (Some(3.0), 3));
    }

    #[test]
    fn nothing_to_aggregate_is_absent() {
        let avg = Aggregation::over(NumericField::Price, AggregationFunction::Avg);
        assert_eq!(compute_aggregate(avg, &[]), (None, 0));
        assert_eq!(compute_aggregate(Aggregation::count(), &[]), (None, 0));
        let crime = Aggregation::over(NumericField::CrimeScore, AggregationFunction::Max);
        assert_eq!(compute_aggregate(crime, &rows()), (None, 0));
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round2(1234.5678), 1234.57);
        assert_eq!(round2(0.0), 0.0);
    }
}
