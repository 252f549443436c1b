//! Loads the cleaned listings CSV into [`PropertyRecord`]s for the offline
//! index build.
use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::schema;
use crate::types::PropertyRecord;

#[derive(Debug, Default)]
pub struct DataProcessor;

impl DataProcessor {
    pub fn new() -> Self { Self }

    pub fn load_csv(&self, path: &Path) -> Result<Vec<PropertyRecord>> {
        if !path.exists() {
            return Err(Error::NotFound(format!("CSV not found at {}", path.display())));
        }
        info!(path = %path.display(), "loading dataset");
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::Dataset(format!("{}: {e}", path.display())))?;
        let records = self.read_records(reader)?;
        info!(count = records.len(), "cleaned records ready to index");
        Ok(records)
    }

    fn read_records<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> Result<Vec<PropertyRecord>> {
        let headers = reader.headers().map_err(|e| Error::Dataset(e.to_string()))?.clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (normalize_header(h), i))
            .collect();

        let missing: Vec<&str> = schema::REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "missing columns auto-filled");
        }

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.map_err(|e| Error::Dataset(format!("row {}: {e}", line + 1)))?;
            let field = |name: &str| cell(&columns, &row, name).to_string();
            records.push(PropertyRecord {
                address: field(schema::ADDRESS),
                price: parse_number(&field(schema::PRICE)),
                bedrooms: parse_number(&field(schema::BEDROOMS)) as i64,
                bathrooms: parse_number(&field(schema::BATHROOMS)) as i64,
                property_type: field(schema::TYPE),
                property_type_full_description: field(schema::PROPERTY_TYPE_FULL_DESCRIPTION),
                flood_risk: field(schema::FLOOD_RISK),
                crime_score_weight: parse_number(&field(schema::CRIME_SCORE)),
                is_new_home: parse_flag(&field(schema::IS_NEW_HOME)),
                laua: field(schema::LAUA),
                listing_update_date: field(schema::LISTING_UPDATE_DATE),
            });
        }
        Ok(records)
    }
}

fn cell<'a>(columns: &HashMap<String, usize>, row: &'a csv::StringRecord, name: &str) -> &'a str {
    columns.get(name).and_then(|&i| row.get(i)).map(str::trim).unwrap_or("")
}

/// `" Listing Update Date "` -> `"listing_update_date"`.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Numeric coercion: anything unparseable becomes 0.
fn parse_number(raw: &str) -> f64 {
    raw.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numbers_and_flags() {
        assert_eq!(parse_number("250,000"), 250000.0);
        assert_eq!(parse_number("n/a"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("yes"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header(" Crime Score Weight "), "crime_score_weight");
        assert_eq!(normalize_header("LAUA"), "laua");
    }
}
