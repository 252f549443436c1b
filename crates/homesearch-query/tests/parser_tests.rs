use homesearch_core::query::{
    Aggregation, AggregationFunction, Comparison, FloodRisk, NumericField, QueryCategory,
};
use homesearch_query::parser::{aggregation_directive, detect_category, property_type};
use homesearch_query::QueryParser;

fn parse(text: &str) -> homesearch_core::query::StructuredQuery {
    QueryParser::new().parse(text, &[])
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn at_least_beats_exact_bedrooms() {
    let q = parse("at least 3 bedrooms");
    let c = q.condition(NumericField::Bedrooms).expect("bedrooms");
    assert_eq!(c.operator, Comparison::Gte);
    assert_eq!(c.value, 3.0);
}

#[test]
fn bedroom_range_is_inclusive_between() {
    let q = parse("3 to 5 bedrooms");
    let c = q.condition(NumericField::Bedrooms).expect("bedrooms");
    assert_eq!(c.operator, Comparison::Between);
    assert_eq!((c.value, c.value_end), (3.0, Some(5.0)));
}

#[test]
fn plus_shorthand_and_spelled_numbers() {
    let c = *parse("4+ beds please").condition(NumericField::Bedrooms).expect("plus");
    assert_eq!((c.operator, c.value), (Comparison::Gte, 4.0));

    let c = *parse("something with two bedrooms").condition(NumericField::Bedrooms).expect("spelled");
    assert_eq!((c.operator, c.value), (Comparison::Eq, 2.0));
}

#[test]
fn bathrooms_with_phrase_is_at_least() {
    let q = parse("flat with 2 bathrooms");
    let c = q.condition(NumericField::Bathrooms).expect("bathrooms");
    assert_eq!((c.operator, c.value), (Comparison::Gte, 2.0));
    assert!(q.condition(NumericField::Bedrooms).is_none());
}

#[test]
fn price_under_and_around() {
    let c = *parse("under 250k").condition(NumericField::Price).expect("under");
    assert_eq!(c.operator, Comparison::Lte);
    assert!(approx(c.value, 250000.0));

    let c = *parse("around 300k").condition(NumericField::Price).expect("around");
    assert_eq!(c.operator, Comparison::Between);
    assert!(approx(c.value, 270000.0));
    assert!(approx(c.value_end.expect("upper bound"), 330000.0));

    let c = *parse("homes ~ £1,200,000").condition(NumericField::Price).expect("tilde");
    assert!(approx(c.value, 1080000.0));
}

#[test]
fn crime_threshold_is_strict() {
    let c = *parse("areas with crime score less than 5").condition(NumericField::CrimeScore).expect("crime");
    assert_eq!((c.operator, c.value), (Comparison::Lt, 5.0));
}

#[test]
fn show_me_houses_with_two_bedrooms() {
    let q = parse("Show me houses with 2 bedrooms");
    assert_eq!(q.category(), QueryCategory::Filter);
    assert_eq!(q.property_type(), Some("house"));
    let c = q.condition(NumericField::Bedrooms).expect("bedrooms");
    assert_eq!((c.operator, c.value), (Comparison::Eq, 2.0));
    assert!(q.aggregation().is_none());
    assert_eq!(q.original_text(), "Show me houses with 2 bedrooms");
}

#[test]
fn average_price_of_hyphenated_bedrooms() {
    let q = parse("What is the average price of 3-bedroom homes?");
    assert_eq!(q.category(), QueryCategory::Aggregation);
    assert_eq!(q.aggregation(), Some(Aggregation::over(NumericField::Price, AggregationFunction::Avg)));
    let c = q.condition(NumericField::Bedrooms).expect("bedrooms");
    assert_eq!((c.operator, c.value), (Comparison::Eq, 3.0));
}

#[test]
fn most_crime_and_compare_directives() {
    let q = parse("Which area has the most crime?");
    assert_eq!(q.category(), QueryCategory::Aggregation);
    assert_eq!(
        q.aggregation(),
        Some(Aggregation::over(NumericField::CrimeScore, AggregationFunction::Max))
    );

    let q = parse("Compare prices between studio and 2 bed homes");
    assert_eq!(q.category(), QueryCategory::Aggregation);
    assert_eq!(
        q.aggregation(),
        Some(Aggregation::over(NumericField::Price, AggregationFunction::Compare))
    );
    assert_eq!(q.property_type(), Some("studio"));
    assert_eq!(q.description_keywords(), ["studio".to_string()]);
}

#[test]
fn count_uses_wildcard_target() {
    assert_eq!(aggregation_directive("count the flats"), Some(Aggregation::count()));
    assert_eq!(aggregation_directive("total number of homes"), Some(Aggregation::count()));
    assert_eq!(aggregation_directive("minimum bedrooms"), None);
}

#[test]
fn aggregation_directive_only_for_aggregation_queries() {
    let q = parse("show flats and count them later");
    assert_eq!(q.category(), QueryCategory::Aggregation);
    assert_eq!(q.aggregation(), Some(Aggregation::count()));
    assert!(parse("show flats").aggregation().is_none());
}

#[test]
fn unrecognised_text_is_unfiltered_retrieval() {
    let q = parse("Something cosy near a park");
    assert_eq!(q.category(), QueryCategory::Retrieval);
    assert!(q.is_unfiltered());
    assert!(q.aggregation().is_none());
    assert!(q.description_keywords().is_empty());
}

#[test]
fn category_priority() {
    assert_eq!(detect_category("show the average price"), QueryCategory::Aggregation);
    assert_eq!(detect_category("list flats"), QueryCategory::Filter);
    assert_eq!(detect_category("quiet street"), QueryCategory::Retrieval);
}

#[test]
fn flood_risk_tiers_prefer_low() {
    assert_eq!(parse("homes with low flood risk").flood_risk(), Some(FloodRisk::Low));
    assert_eq!(parse("very low risk flats").flood_risk(), Some(FloodRisk::Low));
    assert_eq!(parse("medium flood please").flood_risk(), Some(FloodRisk::Medium));
    assert_eq!(parse("high or low risk").flood_risk(), Some(FloodRisk::Low));
    assert_eq!(parse("slowly").flood_risk(), None);
}

#[test]
fn property_type_is_whole_word() {
    assert_eq!(property_type("semi-detached bungalows"), Some("bungalow"));
    assert_eq!(property_type("a flatmate"), None);
    assert_eq!(property_type("terraced"), Some("terraced"));
}

#[test]
fn new_home_area_and_location() {
    let known = vec!["12 Abbey Road".to_string()];
    let q = QueryParser::new().parse("newly built homes in camden area near 12 abbey road", &known);
    assert_eq!(q.is_new_home(), Some(true));
    assert_eq!(q.laua(), Some("camden"));
    assert_eq!(q.address(), Some("12 Abbey Road"));

    let q = parse("old homes");
    assert_eq!(q.is_new_home(), None);
}

#[test]
fn parsing_is_deterministic() {
    let text = "Show me 2 bedroom flats under 300k with low flood risk";
    assert_eq!(parse(text), parse(text));
}
