//! Column names of the property table and the field groups used by the
//! query pipeline.

pub const ADDRESS: &str = "address";
pub const PRICE: &str = "price";
pub const BEDROOMS: &str = "bedrooms";
pub const BATHROOMS: &str = "bathrooms";
pub const TYPE: &str = "type";
pub const PROPERTY_TYPE_FULL_DESCRIPTION: &str = "property_type_full_description";
pub const FLOOD_RISK: &str = "flood_risk";
pub const CRIME_SCORE: &str = "crime_score_weight";
pub const IS_NEW_HOME: &str = "is_new_home";
pub const LAUA: &str = "laua";
pub const LISTING_UPDATE_DATE: &str = "listing_update_date";

/// Extra column attached to records returned by the vector fallback.
pub const SIMILARITY_SCORE: &str = "similarity_score";

/// Every column a property table is expected to carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    ADDRESS,
    PRICE,
    BEDROOMS,
    BATHROOMS,
    TYPE,
    PROPERTY_TYPE_FULL_DESCRIPTION,
    FLOOD_RISK,
    CRIME_SCORE,
    IS_NEW_HOME,
    LAUA,
    LISTING_UPDATE_DATE,
];

pub const BOOLEAN_FIELDS: [&str; 1] = [IS_NEW_HOME];

/// Columns shown for filter and retrieval results, in display order.
pub const DISPLAY_COLUMNS: [&str; 8] = [
    ADDRESS,
    PRICE,
    BEDROOMS,
    BATHROOMS,
    TYPE,
    PROPERTY_TYPE_FULL_DESCRIPTION,
    FLOOD_RISK,
    CRIME_SCORE,
];

pub fn is_boolean_field(column: &str) -> bool {
    BOOLEAN_FIELDS.contains(&column)
}
