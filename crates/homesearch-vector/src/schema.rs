use arrow_array::types::Float32Type;
use arrow_array::{
    ArrayRef, BooleanArray, FixedSizeListArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{ArrowError, DataType, Field, Schema};
use std::sync::Arc;

use homesearch_core::schema as cols;
use homesearch_core::types::PropertyRecord;

pub const ROW_ID: &str = "row_id";
/// Text that was embedded for the row.
pub const CONTENT: &str = "content";
pub const VECTOR: &str = "vector";
/// Added by LanceDB to nearest-neighbour results.
pub const DISTANCE: &str = "_distance";

pub fn build_property_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ROW_ID, DataType::Int64, false),
        Field::new(cols::ADDRESS, DataType::Utf8, false),
        Field::new(cols::PRICE, DataType::Float64, false),
        Field::new(cols::BEDROOMS, DataType::Int64, false),
        Field::new(cols::BATHROOMS, DataType::Int64, false),
        Field::new(cols::TYPE, DataType::Utf8, false),
        Field::new(cols::PROPERTY_TYPE_FULL_DESCRIPTION, DataType::Utf8, false),
        Field::new(cols::FLOOD_RISK, DataType::Utf8, false),
        Field::new(cols::CRIME_SCORE, DataType::Float64, false),
        Field::new(cols::IS_NEW_HOME, DataType::Boolean, false),
        Field::new(cols::LAUA, DataType::Utf8, false),
        Field::new(cols::LISTING_UPDATE_DATE, DataType::Utf8, false),
        Field::new(CONTENT, DataType::Utf8, false),
        Field::new(
            VECTOR,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

/// One Arrow batch for `records[i]` / `embeddings[i]`; row ids start at
/// `first_row_id`.
pub fn records_to_batch(
    records: &[PropertyRecord],
    embeddings: &[Vec<f32>],
    dim: i32,
    first_row_id: i64,
) -> Result<RecordBatch, ArrowError> {
    let strings = |f: fn(&PropertyRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(records.iter().map(f)))
    };
    let vectors = embeddings.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values((0..records.len() as i64).map(|i| first_row_id + i))),
        strings(|r| &r.address),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.price))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.bedrooms))),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.bathrooms))),
        strings(|r| &r.property_type),
        strings(|r| &r.property_type_full_description),
        strings(|r| &r.flood_risk),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.crime_score_weight))),
        Arc::new(BooleanArray::from(records.iter().map(|r| r.is_new_home).collect::<Vec<_>>())),
        strings(|r| &r.laua),
        strings(|r| &r.listing_update_date),
        Arc::new(StringArray::from_iter_values(records.iter().map(PropertyRecord::embedding_text))),
        Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
    ];
    RecordBatch::try_new(build_property_schema(dim), columns)
}
