//! homesearch-query
//!
//! Rule-based natural-language parser that turns a free-text property
//! question into a [`StructuredQuery`](homesearch_core::query::StructuredQuery).
//! See `parser` for the extraction order and `patterns` for the per-field
//! rule cascades.
pub mod location;
pub mod parser;
pub mod patterns;

pub use parser::QueryParser;
