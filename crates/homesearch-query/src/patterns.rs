//! Ordered pattern cascades, one per numeric field.
//!
//! Each cascade is a list of (pattern, builder) rules tried in declared
//! order. The first rule whose pattern matches decides the field: its
//! builder produces the condition and no later rule is consulted, even if
//! the builder cannot convert the captured value. Rules are ordered from
//! most to least specific: comparison phrases, ranges, `N+` shorthand, bare
//! `N units`, spelled-out numbers.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use homesearch_core::query::{Comparison, NumericCondition, NumericField};

const BEDROOM_UNIT: &str = r"(?:bedrooms?|bhk|beds?)";
const BATHROOM_UNIT: &str = r"(?:bathrooms?|baths?)";
const MONEY: &str = r"[$£]?(\d[\d,\.]*k?)";

/// Half-width of the window produced by "around N" prices.
pub const AROUND_TOLERANCE: f64 = 0.1;

const NUMBER_WORDS: [(&str, u32); 10] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

type Builder = fn(NumericField, &Captures<'_>) -> Option<NumericCondition>;

pub struct Rule {
    name: &'static str,
    pattern: Regex,
    build: Builder,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: Builder) -> Self {
        let pattern = Regex::new(pattern).expect("valid field pattern");
        Self { name, pattern, build }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub struct FieldCascade {
    field: NumericField,
    rules: Vec<Rule>,
}

impl FieldCascade {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs the rules in order; the first matching pattern wins.
    pub fn extract(&self, text: &str) -> Option<NumericCondition> {
        let (rule, caps) = self
            .rules
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule, caps)))?;
        let condition = (rule.build)(self.field, &caps);
        debug!(field = %self.field, rule = rule.name, ?condition, "numeric pattern matched");
        condition
    }
}

pub static BEDROOMS: Lazy<FieldCascade> = Lazy::new(|| FieldCascade {
    field: NumericField::Bedrooms,
    rules: vec![
        Rule::new(
            "at-least",
            &format!(r"(?:at least|minimum|min|>=|greater than|more than)\s*(\d+)[\s-]*{BEDROOM_UNIT}"),
            at_least,
        ),
        Rule::new("range", &format!(r"(\d+)\s*(?:to|-)\s*(\d+)[\s-]*{BEDROOM_UNIT}"), range),
        Rule::new("plus", &format!(r"(\d+)\+[\s-]*{BEDROOM_UNIT}"), at_least),
        Rule::new("exact", &format!(r"\b(\d+)[\s-]*{BEDROOM_UNIT}\b"), exactly),
        Rule::new("spelled", &format!(r"\b({})\b[\s-]*{BEDROOM_UNIT}", number_word_alternation()), spelled),
    ],
});

pub static BATHROOMS: Lazy<FieldCascade> = Lazy::new(|| FieldCascade {
    field: NumericField::Bathrooms,
    rules: vec![
        Rule::new(
            "at-least",
            &format!(r"(?:with\s*|at least\s*|minimum\s*|>=|more than\s*)(\d+)\s*\+?[\s-]*{BATHROOM_UNIT}"),
            at_least,
        ),
        Rule::new("range", &format!(r"(\d+)\s*(?:to|-)\s*(\d+)[\s-]*{BATHROOM_UNIT}"), range),
        Rule::new("plus", &format!(r"\b(\d+)\+[\s-]*{BATHROOM_UNIT}\b"), at_least),
        Rule::new("exact", &format!(r"\b(\d+)[\s-]*{BATHROOM_UNIT}\b"), exactly),
    ],
});

pub static PRICE: Lazy<FieldCascade> = Lazy::new(|| FieldCascade {
    field: NumericField::Price,
    rules: vec![
        Rule::new("under", &format!(r"(?:under|below|less than)\s*{MONEY}"), at_most_money),
        Rule::new("around", &format!(r"(?:\baround|~)\s*{MONEY}"), around_money),
    ],
});

pub static CRIME_SCORE: Lazy<FieldCascade> = Lazy::new(|| FieldCascade {
    field: NumericField::CrimeScore,
    rules: vec![Rule::new("less-than", r"crime.*(?:less than|<)\s*(\d+)", less_than)],
});

/// All cascades, in the order the parser applies them.
pub fn cascades() -> [&'static FieldCascade; 4] {
    [&BEDROOMS, &BATHROOMS, &PRICE, &CRIME_SCORE]
}

fn number_word_alternation() -> String {
    NUMBER_WORDS.iter().map(|(w, _)| *w).collect::<Vec<_>>().join("|")
}

pub fn word_to_number(word: &str) -> Option<u32> {
    NUMBER_WORDS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

fn count(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse::<u32>().ok().map(f64::from)
}

/// `"250k"` -> 250000, `"1,250,000"` -> 1250000. A trailing sentence period
/// is ignored.
pub fn parse_money(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim_end_matches('.');
    let value = match cleaned.strip_suffix('k') {
        Some(thousands) => thousands.parse::<f64>().ok()? * 1000.0,
        None => cleaned.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn at_least(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    Some(NumericCondition::new(field, Comparison::Gte, count(caps, 1)?))
}

fn exactly(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    Some(NumericCondition::new(field, Comparison::Eq, count(caps, 1)?))
}

fn less_than(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    Some(NumericCondition::new(field, Comparison::Lt, count(caps, 1)?))
}

fn range(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    Some(NumericCondition::between(field, count(caps, 1)?, count(caps, 2)?))
}

fn spelled(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    let n = word_to_number(caps.get(1)?.as_str())?;
    Some(NumericCondition::new(field, Comparison::Eq, f64::from(n)))
}

fn at_most_money(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    Some(NumericCondition::new(field, Comparison::Lte, parse_money(caps.get(1)?.as_str())?))
}

fn around_money(field: NumericField, caps: &Captures<'_>) -> Option<NumericCondition> {
    let center = parse_money(caps.get(1)?.as_str())?;
    Some(NumericCondition::between(
        field,
        center * (1.0 - AROUND_TOLERANCE),
        center * (1.0 + AROUND_TOLERANCE),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_values() {
        assert_eq!(parse_money("250k"), Some(250000.0));
        assert_eq!(parse_money("1,250,000"), Some(1250000.0));
        assert_eq!(parse_money("1.5k"), Some(1500.0));
        assert_eq!(parse_money("300k."), Some(300000.0));
        assert_eq!(parse_money("1.2.3"), None);
    }

    #[test]
    fn declared_rule_order_is_specificity_first() {
        let names: Vec<&str> = BEDROOMS.rules().iter().map(Rule::name).collect();
        assert_eq!(names, vec!["at-least", "range", "plus", "exact", "spelled"]);
        let names: Vec<&str> = BATHROOMS.rules().iter().map(Rule::name).collect();
        assert_eq!(names, vec!["at-least", "range", "plus", "exact"]);
    }

    #[test]
    fn unconvertible_capture_does_not_fall_through() {
        // "under 1.2.3" matches the first price rule; the bad value leaves
        // price unset instead of trying "around".
        assert_eq!(PRICE.extract("under 1.2.3 or around 300k"), None);
    }

    #[test]
    fn number_words() {
        assert_eq!(word_to_number("three"), Some(3));
        assert_eq!(word_to_number("eleven"), None);
    }
}
