//! Offline rule-based query parser.
//!
//! Extraction runs on the lower-cased, trimmed text in this order:
//! category, numeric cascades, flood risk, new-home flag, local-authority
//! area, property type, location, description keywords and, for
//! aggregation queries, the aggregation directive. Every step is
//! first-match-wins over a fixed, declared order.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use homesearch_core::query::{
    Aggregation, AggregationFunction, FloodRisk, NumericField, QueryCategory, StructuredQuery,
};

use crate::location::extract_location;
use crate::patterns;

const AGGREGATION_KEYWORDS: [&str; 10] = [
    "average", "avg", "mean", "sum", "count", "total number", "compare", "most", "minimum", "maximum",
];

const FILTER_KEYWORDS: [&str; 7] = ["show", "list", "find", "display", "properties", "homes", "houses"];

pub const PROPERTY_TYPES: [&str; 8] = [
    "house",
    "flat",
    "apartment",
    "bungalow",
    "detached",
    "semi-detached",
    "terraced",
    "studio",
];

pub const DESCRIPTION_KEYWORDS: [&str; 5] = ["studio", "luxury", "affordable", "cheap", "family"];

/// Checked low, then medium, then high: when several tier words occur the
/// earliest tier in this list wins, regardless of position in the text.
static FLOOD_RISK_RULES: Lazy<[(FloodRisk, Regex); 3]> = Lazy::new(|| {
    let rule = |tier, pattern: &str| (tier, Regex::new(pattern).expect("valid flood risk regex"));
    [
        rule(FloodRisk::Low, r"\b(?:very\s+low|low)(?:\s+flood\s+risk|\s+flood|\s+risk)?"),
        rule(FloodRisk::Medium, r"\bmedium(?:\s+flood\s+risk|\s+flood|\s+risk)?"),
        rule(FloodRisk::High, r"\bhigh(?:\s+flood\s+risk|\s+flood|\s+risk)?"),
    ]
});

/// Whole-word match; a trailing plural `s` is accepted.
static PROPERTY_TYPE_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PROPERTY_TYPES
        .iter()
        .map(|t| {
            let pattern = format!(r"\b{}s?\b", regex::escape(t));
            (*t, Regex::new(&pattern).expect("valid property type regex"))
        })
        .collect()
});

static AREA_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"in\s+([a-z\s]+)\s+area").expect("valid area regex"));

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: text that matches no rule yields an unfiltered
    /// retrieval query.
    pub fn parse(&self, text: &str, known_locations: &[String]) -> StructuredQuery {
        let q = text.trim().to_lowercase();
        let category = detect_category(&q);

        let mut builder = StructuredQuery::builder(category, text);
        for cascade in patterns::cascades() {
            builder = builder.maybe_condition(cascade.extract(&q));
        }

        let aggregation = match category {
            QueryCategory::Aggregation => aggregation_directive(&q),
            _ => None,
        };

        let builder = builder
            .flood_risk(flood_risk(&q))
            .is_new_home(is_new_home(&q).then_some(true))
            .laua(local_authority_area(&q))
            .property_type(property_type(&q).map(str::to_string))
            .address(extract_location(&q, known_locations))
            .description_keywords(description_keywords(&q))
            .aggregation(aggregation);

        match builder.build() {
            Ok(parsed) => {
                debug!(query = ?parsed, "parsed query");
                parsed
            }
            Err(e) => {
                warn!(error = %e, "parsed query rejected, falling back to retrieval");
                StructuredQuery::retrieval(text)
            }
        }
    }
}

pub fn detect_category(q: &str) -> QueryCategory {
    if AGGREGATION_KEYWORDS.iter().any(|k| q.contains(k)) {
        QueryCategory::Aggregation
    } else if FILTER_KEYWORDS.iter().any(|k| q.contains(k)) {
        QueryCategory::Filter
    } else {
        QueryCategory::Retrieval
    }
}

pub fn flood_risk(q: &str) -> Option<FloodRisk> {
    FLOOD_RISK_RULES.iter().find(|(_, re)| re.is_match(q)).map(|(tier, _)| *tier)
}

fn is_new_home(q: &str) -> bool {
    q.contains("new home") || q.contains("newly built")
}

fn local_authority_area(q: &str) -> Option<String> {
    let caps = AREA_PHRASE.captures(q)?;
    let area = caps.get(1)?.as_str().trim();
    (!area.is_empty()).then(|| area.to_string())
}

pub fn property_type(q: &str) -> Option<&'static str> {
    PROPERTY_TYPE_RULES.iter().find(|(_, re)| re.is_match(q)).map(|(t, _)| *t)
}

fn description_keywords(q: &str) -> Vec<String> {
    DESCRIPTION_KEYWORDS.iter().filter(|k| q.contains(*k)).map(|k| k.to_string()).collect()
}

/// Fixed priority chain; the first satisfied rule decides.
pub fn aggregation_directive(q: &str) -> Option<Aggregation> {
    if q.contains("crime") && q.contains("most") {
        Some(Aggregation::over(NumericField::CrimeScore, AggregationFunction::Max))
    } else if q.contains("average price") || q.contains("mean price") {
        Some(Aggregation::over(NumericField::Price, AggregationFunction::Avg))
    } else if q.contains("compare") && q.contains("price") {
        Some(Aggregation::over(NumericField::Price, AggregationFunction::Compare))
    } else if q.contains("sum") {
        Some(Aggregation::over(NumericField::Price, AggregationFunction::Sum))
    } else if q.contains("count") || q.contains("total number") {
        Some(Aggregation::count())
    } else {
        None
    }
}
