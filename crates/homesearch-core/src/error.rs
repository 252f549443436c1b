use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A structured query that violates its construction invariants.
    #[error("Invalid query: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
