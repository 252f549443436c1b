//! homesearch-vector
//!
//! LanceDB index of per-listing embeddings. Each row carries the full
//! property record next to its vector, so search results need no join
//! against the relational store.
pub mod schema;
pub mod search;
pub mod writer;

pub use search::LanceVectorIndex;
pub use writer::LancePropertyIndexer;
