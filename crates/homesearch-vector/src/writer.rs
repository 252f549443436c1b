use anyhow::{bail, Result};
use arrow_array::RecordBatchIterator;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use tracing::info;

use homesearch_core::types::PropertyRecord;

use crate::schema::{build_property_schema, records_to_batch};

const BATCH_SIZE: usize = 1000;

/// Writes listings and their embeddings into one LanceDB table.
pub struct LancePropertyIndexer {
    db: Connection,
    table_name: String,
    dim: i32,
}

impl LancePropertyIndexer {
    pub async fn new(dir: &Path, table_name: &str, dim: usize) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = connect(dir.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string(), dim: i32::try_from(dim)? })
    }

    /// Replaces the table with `records`. `embeddings[i]` belongs to
    /// `records[i]`.
    pub async fn rebuild(&self, records: &[PropertyRecord], embeddings: &[Vec<f32>]) -> Result<usize> {
        if records.len() != embeddings.len() {
            bail!("{} records but {} embeddings", records.len(), embeddings.len());
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim as usize) {
            bail!("embedding has dimension {}, index expects {}", bad.len(), self.dim);
        }

        if self.db.table_names().execute().await?.contains(&self.table_name) {
            info!(table = %self.table_name, "dropping previous vector table");
            self.db.drop_table(&self.table_name, &[]).await?;
        }

        info!(count = records.len(), table = %self.table_name, "indexing listings into LanceDB");
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} listings ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );

        let mut written = 0usize;
        for (records, embeddings) in records.chunks(BATCH_SIZE).zip(embeddings.chunks(BATCH_SIZE)) {
            self.insert_batch(records, embeddings, written as i64).await?;
            written += records.len();
            pb.set_position(written as u64);
        }
        if written == 0 {
            // keep an empty, queryable table so serving can start
            self.insert_batch(&[], &[], 0).await?;
        }
        pb.finish_with_message("done");
        info!(written, "LanceDB indexing completed");
        Ok(written)
    }

    async fn insert_batch(&self, records: &[PropertyRecord], embeddings: &[Vec<f32>], first_row_id: i64) -> Result<()> {
        let schema = build_property_schema(self.dim);
        let batch = records_to_batch(records, embeddings, self.dim, first_row_id)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        if self.db.table_names().execute().await?.contains(&self.table_name) {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }
}
