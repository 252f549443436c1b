//! homesearch-pipeline
//!
//! Question in, answer out: [`PropertyRag`] runs parse → execute → render
//! and always returns a [`RenderedResponse`], degrading to an error
//! narrative with empty tables instead of failing.
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, info, warn};

use homesearch_core::config::{expand_path, Settings};
use homesearch_core::error::{Error, Result};
use homesearch_core::query::StructuredQuery;
use homesearch_core::result::RenderedResponse;
use homesearch_embed::get_default_embedder;
use homesearch_query::QueryParser;
use homesearch_store::SqliteStore;
use homesearch_vector::LanceVectorIndex;

pub mod executor;
pub mod response;
pub mod sql;

pub use executor::QueryExecutor;
pub use response::ResponseGenerator;

pub struct PropertyRag {
    parser: QueryParser,
    executor: QueryExecutor,
    generator: ResponseGenerator,
}

impl PropertyRag {
    pub fn new(executor: QueryExecutor, generator: ResponseGenerator) -> Self {
        Self { parser: QueryParser::new(), executor, generator }
    }

    /// Opens the SQLite store, the vector index and the embedder named by
    /// `settings`. Either data source missing is a startup error.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        info!("initializing property pipeline");
        let store = SqliteStore::open(&expand_path(&settings.data.sqlite_path))?;
        let index = LanceVectorIndex::open(&expand_path(&settings.data.lancedb_dir), &settings.data.vector_table)?;
        let embedder =
            get_default_embedder(&settings.embedding).map_err(|e| Error::Embedding(e.to_string()))?;
        let executor = QueryExecutor::new(Box::new(store), Box::new(index), embedder)
            .with_top_k(settings.search.top_k);
        info!("property pipeline ready");
        Ok(Self::new(executor, ResponseGenerator::new(settings.search.preview_rows)))
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Parses `text` with the store's known locations; nothing is executed.
    pub fn parse(&self, text: &str) -> StructuredQuery {
        self.parser.parse(text, self.known_locations())
    }

    /// Never fails: errors and panics anywhere below become an error
    /// narrative with two empty tables.
    pub fn process(&self, text: &str) -> RenderedResponse {
        match catch_unwind(AssertUnwindSafe(|| self.try_process(text))) {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(error = %e, query = text, "error processing query");
                RenderedResponse::message(format!("An error occurred while processing your query: {e}"))
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(%reason, query = text, "panic while processing query");
                RenderedResponse::message(format!("An error occurred while processing your query: {reason}"))
            }
        }
    }

    fn try_process(&self, text: &str) -> Result<RenderedResponse> {
        let query = self.parser.parse(text, self.known_locations());
        info!(category = %query.category(), "query parsed");

        let result = self.executor.execute(&query)?;
        let response = self.generator.render(text, &query, &result);
        if response.full.is_empty() {
            info!("no results found");
        } else {
            info!(total = response.full.len(), preview = response.preview.len(), "query answered");
        }
        Ok(response)
    }

    /// Location lookup failures only cost location matching.
    fn known_locations(&self) -> &[String] {
        match self.executor.known_locations() {
            Ok(locations) => locations,
            Err(e) => {
                warn!(error = %e, "known locations unavailable");
                &[]
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "internal error".to_string())
}
