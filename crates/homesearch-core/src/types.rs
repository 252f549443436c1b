//! Row-level domain types shared by the store, the vector index and the
//! response generator.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::schema;

/// A single scalar cell. Serializes as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell. Text is accepted when it parses as a number,
    /// everything else (null, booleans, free text) is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) if r.is_finite() => Some(*r),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// A flat, ordered mapping from column name to scalar value.
///
/// Column order is preserved so that tables render in the order the
/// columns were selected. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column`, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Keeps only `columns`, in the given order. Columns absent from this
    /// record are skipped.
    pub fn project(&self, columns: &[&str]) -> Record {
        let mut out = Record::new();
        for column in columns {
            if let Some(value) = self.get(column) {
                out.columns.push(((*column).to_string(), value.clone()));
            }
        }
        out
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// One property listing as produced by the offline dataset build.
///
/// The relational store and the vector index metadata both hold these
/// records; at query time the store returns them as generic [`Record`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub price: f64,
    pub bedrooms: i64,
    pub bathrooms: i64,
    #[serde(rename = "type")]
    pub property_type: String,
    pub property_type_full_description: String,
    pub flood_risk: String,
    pub crime_score_weight: f64,
    pub is_new_home: bool,
    pub laua: String,
    pub listing_update_date: String,
}

impl PropertyRecord {
    pub fn to_record(&self) -> Record {
        Record::new()
            .with(schema::ADDRESS, self.address.as_str())
            .with(schema::PRICE, self.price)
            .with(schema::BEDROOMS, self.bedrooms)
            .with(schema::BATHROOMS, self.bathrooms)
            .with(schema::TYPE, self.property_type.as_str())
            .with(
                schema::PROPERTY_TYPE_FULL_DESCRIPTION,
                self.property_type_full_description.as_str(),
            )
            .with(schema::FLOOD_RISK, self.flood_risk.as_str())
            .with(schema::CRIME_SCORE, self.crime_score_weight)
            .with(schema::IS_NEW_HOME, self.is_new_home)
            .with(schema::LAUA, self.laua.as_str())
            .with(schema::LISTING_UPDATE_DATE, self.listing_update_date.as_str())
    }

    /// Text fed to the embedder for this listing, both when the index is
    /// built and (by construction) comparable to free-text queries.
    pub fn embedding_text(&self) -> String {
        format!(
            "Type: {}, Bedrooms: {}, Bathrooms: {}, Price: {}, Flood risk: {}, Crime score: {}, New home: {}, Location: {}, Address: {}. Listing date: {}",
            self.property_type,
            self.bedrooms,
            self.bathrooms,
            self.price,
            self.flood_risk,
            self.crime_score_weight,
            self.is_new_home,
            self.laua,
            self.address,
            self.listing_update_date,
        )
    }
}

/// A record returned by nearest-neighbour search, with its L2 distance to
/// the query vector (lower is closer).
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: PropertyRecord,
    pub distance: f32,
}
