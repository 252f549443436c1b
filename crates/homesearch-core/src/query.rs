//! The structured query model: the parsed intent of one user question.
//!
//! A [`StructuredQuery`] can only be obtained through
//! [`StructuredQueryBuilder::build`], which rejects aggregation directives
//! that do not fit the query category or the target field. Once built, the
//! query is read-only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryCategory {
    Filter,
    Aggregation,
    Retrieval,
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryCategory::Filter => "filter",
            QueryCategory::Aggregation => "aggregation",
            QueryCategory::Retrieval => "retrieval",
        })
    }
}

/// Numeric columns that conditions and aggregations can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Bedrooms,
    Bathrooms,
    Price,
    #[serde(rename = "crime_score_weight")]
    CrimeScore,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::Bedrooms,
        NumericField::Bathrooms,
        NumericField::Price,
        NumericField::CrimeScore,
    ];

    pub fn column(self) -> &'static str {
        match self {
            NumericField::Bedrooms => schema::BEDROOMS,
            NumericField::Bathrooms => schema::BATHROOMS,
            NumericField::Price => schema::PRICE,
            NumericField::CrimeScore => schema::CRIME_SCORE,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Between,
}

/// One field/operator/value(s) predicate. `value_end` is set only for
/// [`Comparison::Between`], whose bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericCondition {
    pub field: NumericField,
    pub operator: Comparison,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_end: Option<f64>,
}

impl NumericCondition {
    pub fn new(field: NumericField, operator: Comparison, value: f64) -> Self {
        Self { field, operator, value, value_end: None }
    }

    pub fn between(field: NumericField, low: f64, high: f64) -> Self {
        Self { field, operator: Comparison::Between, value: low, value_end: Some(high) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodRisk {
    Low,
    Medium,
    High,
}

impl FloodRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            FloodRisk::Low => "low",
            FloodRisk::Medium => "medium",
            FloodRisk::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationFunction {
    Count,
    Avg,
    Sum,
    Min,
    Max,
    Compare,
}

impl AggregationFunction {
    /// Functions that are only meaningful over a numeric column.
    pub fn requires_numeric_field(self) -> bool {
        matches!(
            self,
            AggregationFunction::Avg
                | AggregationFunction::Sum
                | AggregationFunction::Min
                | AggregationFunction::Max
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationFunction::Count => "COUNT",
            AggregationFunction::Avg => "AVG",
            AggregationFunction::Sum => "SUM",
            AggregationFunction::Min => "MIN",
            AggregationFunction::Max => "MAX",
            AggregationFunction::Compare => "COMPARE",
        }
    }
}

impl fmt::Display for AggregationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an aggregation runs over: every row (`*`) or one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationTarget {
    #[serde(rename = "*")]
    AllRows,
    #[serde(untagged)]
    Field(NumericField),
}

impl fmt::Display for AggregationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationTarget::AllRows => f.write_str("*"),
            AggregationTarget::Field(field) => field.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub target: AggregationTarget,
    pub function: AggregationFunction,
}

impl Aggregation {
    pub fn new(target: AggregationTarget, function: AggregationFunction) -> Self {
        Self { target, function }
    }

    pub fn over(field: NumericField, function: AggregationFunction) -> Self {
        Self::new(AggregationTarget::Field(field), function)
    }

    pub fn count() -> Self {
        Self::new(AggregationTarget::AllRows, AggregationFunction::Count)
    }
}

/// Parsed intent of one user question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredQuery {
    category: QueryCategory,
    original_text: String,
    bedrooms: Option<NumericCondition>,
    bathrooms: Option<NumericCondition>,
    price: Option<NumericCondition>,
    crime_score: Option<NumericCondition>,
    flood_risk: Option<FloodRisk>,
    is_new_home: Option<bool>,
    laua: Option<String>,
    property_type: Option<String>,
    address: Option<String>,
    aggregation: Option<Aggregation>,
    description_keywords: Vec<String>,
}

impl StructuredQuery {
    pub fn builder(category: QueryCategory, original_text: impl Into<String>) -> StructuredQueryBuilder {
        StructuredQueryBuilder {
            query: StructuredQuery {
                category,
                original_text: original_text.into(),
                bedrooms: None,
                bathrooms: None,
                price: None,
                crime_score: None,
                flood_risk: None,
                is_new_home: None,
                laua: None,
                property_type: None,
                address: None,
                aggregation: None,
                description_keywords: Vec::new(),
            },
        }
    }

    /// Unfiltered retrieval query; valid by construction.
    pub fn retrieval(original_text: impl Into<String>) -> StructuredQuery {
        Self::builder(QueryCategory::Retrieval, original_text).query
    }

    pub fn category(&self) -> QueryCategory {
        self.category
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn condition(&self, field: NumericField) -> Option<&NumericCondition> {
        match field {
            NumericField::Bedrooms => self.bedrooms.as_ref(),
            NumericField::Bathrooms => self.bathrooms.as_ref(),
            NumericField::Price => self.price.as_ref(),
            NumericField::CrimeScore => self.crime_score.as_ref(),
        }
    }

    /// Set numeric conditions in fixed field order (bedrooms, bathrooms,
    /// price, crime score).
    pub fn conditions(&self) -> impl Iterator<Item = &NumericCondition> {
        NumericField::ALL.into_iter().filter_map(|field| self.condition(field))
    }

    pub fn flood_risk(&self) -> Option<FloodRisk> {
        self.flood_risk
    }

    pub fn is_new_home(&self) -> Option<bool> {
        self.is_new_home
    }

    pub fn laua(&self) -> Option<&str> {
        self.laua.as_deref()
    }

    pub fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn aggregation(&self) -> Option<Aggregation> {
        self.aggregation
    }

    /// Advisory keywords; not used for filtering.
    pub fn description_keywords(&self) -> &[String] {
        &self.description_keywords
    }

    /// True when no filter of any kind is set.
    pub fn is_unfiltered(&self) -> bool {
        self.conditions().next().is_none()
            && self.flood_risk.is_none()
            && self.is_new_home.is_none()
            && self.laua.is_none()
            && self.property_type.is_none()
            && self.address.is_none()
    }
}

/// Factory for [`StructuredQuery`]; all invariants are checked in
/// [`build`](StructuredQueryBuilder::build).
#[derive(Debug, Clone)]
pub struct StructuredQueryBuilder {
    query: StructuredQuery,
}

impl StructuredQueryBuilder {
    /// Stores `condition` in the slot of its own field, replacing any
    /// earlier condition on that field.
    pub fn condition(mut self, condition: NumericCondition) -> Self {
        let slot = match condition.field {
            NumericField::Bedrooms => &mut self.query.bedrooms,
            NumericField::Bathrooms => &mut self.query.bathrooms,
            NumericField::Price => &mut self.query.price,
            NumericField::CrimeScore => &mut self.query.crime_score,
        };
        *slot = Some(condition);
        self
    }

    pub fn maybe_condition(self, condition: Option<NumericCondition>) -> Self {
        match condition {
            Some(c) => self.condition(c),
            None => self,
        }
    }

    pub fn flood_risk(mut self, flood_risk: Option<FloodRisk>) -> Self {
        self.query.flood_risk = flood_risk;
        self
    }

    pub fn is_new_home(mut self, is_new_home: Option<bool>) -> Self {
        self.query.is_new_home = is_new_home;
        self
    }

    pub fn laua(mut self, laua: Option<String>) -> Self {
        self.query.laua = laua;
        self
    }

    pub fn property_type(mut self, property_type: Option<String>) -> Self {
        self.query.property_type = property_type;
        self
    }

    pub fn address(mut self, address: Option<String>) -> Self {
        self.query.address = address;
        self
    }

    pub fn aggregation(mut self, aggregation: Option<Aggregation>) -> Self {
        self.query.aggregation = aggregation;
        self
    }

    pub fn description_keywords(mut self, keywords: Vec<String>) -> Self {
        self.query.description_keywords = keywords;
        self
    }

    pub fn build(self) -> Result<StructuredQuery> {
        if let Some(aggregation) = self.query.aggregation {
            if self.query.category != QueryCategory::Aggregation {
                return Err(Error::Validation(format!(
                    "aggregation over '{}' is only allowed for aggregation queries, not {}",
                    aggregation.target, self.query.category
                )));
            }
            if aggregation.function.requires_numeric_field()
                && aggregation.target == AggregationTarget::AllRows
            {
                let fields: Vec<&str> = NumericField::ALL.iter().map(|f| f.column()).collect();
                return Err(Error::Validation(format!(
                    "{} can only be applied to numeric fields: {}",
                    aggregation.function,
                    fields.join(", ")
                )));
            }
        }
        for condition in self.query.conditions() {
            let bounded = condition.value_end.is_some();
            if bounded != (condition.operator == Comparison::Between) {
                return Err(Error::Validation(format!(
                    "condition on {} must carry an upper bound exactly when it is a range",
                    condition.field
                )));
            }
        }
        Ok(self.query)
    }
}
