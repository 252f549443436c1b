use crate::error::Result;
use crate::types::{Record, ScoredRecord, Value};

/// Maps free text to fixed-dimension, L2-normalized vectors. The same
/// embedder must be used to build the vector index and to query it.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Read-only access to the table of property records.
///
/// Statements use positional `?` placeholders; `params` are bound in order
/// and never interpolated into the SQL text.
pub trait PropertyStore: Send + Sync {
    /// Name of the discovered property table.
    fn table_name(&self) -> &str;
    fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>>;
    /// Distinct, non-null, non-empty address values in order of first
    /// appearance.
    fn distinct_addresses(&self) -> Result<Vec<String>>;
}

/// Nearest-neighbour search over the prebuilt per-record vectors.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` records ordered by ascending distance to `query_vec`.
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;
}
