//! homesearch-store
//!
//! SQLite-backed [`PropertyStore`](homesearch_core::traits::PropertyStore).
//! The query path opens the database read-only; the indexer uses
//! [`SqliteStore::create`] to (re)write the property table.
pub mod sqlite;

pub use sqlite::{quote_ident, SqliteStore};
