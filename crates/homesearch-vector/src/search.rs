use arrow_array::{
    Array, BooleanArray, Float32Array, Float64Array, Int64Array, RecordBatch, StringArray,
};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Table};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use homesearch_core::error::{Error, Result};
use homesearch_core::schema as cols;
use homesearch_core::traits::VectorIndex;
use homesearch_core::types::{PropertyRecord, ScoredRecord};

use crate::schema::DISTANCE;

/// Blocking facade over a LanceDB table; owns the runtime that drives it.
/// Must not be called from inside another Tokio runtime.
pub struct LanceVectorIndex {
    rt: Runtime,
    table: Table,
}

impl LanceVectorIndex {
    /// Opens `table_name` under `dir`. A missing table is a startup error.
    pub fn open(dir: &Path, table_name: &str) -> Result<Self> {
        if !dir.exists() {
            return Err(Error::NotFound(format!("vector store not found at {}", dir.display())));
        }
        let rt = Runtime::new().map_err(|e| Error::Index(format!("failed to start runtime: {e}")))?;
        let table = rt.block_on(async {
            let db = connect(dir.to_string_lossy().as_ref()).execute().await.map_err(index_err)?;
            let names = db.table_names().execute().await.map_err(index_err)?;
            if !names.iter().any(|n| n == table_name) {
                return Err(Error::NotFound(format!(
                    "vector table '{table_name}' not found in {}",
                    dir.display()
                )));
            }
            db.open_table(table_name).execute().await.map_err(index_err)
        })?;
        info!(dir = %dir.display(), table = table_name, "opened vector index");
        Ok(Self { rt, table })
    }

    pub fn count_rows(&self) -> Result<usize> {
        self.rt.block_on(self.table.count_rows(None)).map_err(index_err)
    }
}

impl VectorIndex for LanceVectorIndex {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let batches: Vec<RecordBatch> = self.rt.block_on(async {
            self.table
                .vector_search(query_vec.to_vec())
                .map_err(index_err)?
                .limit(k)
                .execute()
                .await
                .map_err(index_err)?
                .try_collect()
                .await
                .map_err(index_err)
        })?;

        let mut hits = Vec::with_capacity(k);
        for batch in &batches {
            decode_batch(batch, &mut hits)?;
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        debug!(k, returned = hits.len(), "vector search");
        Ok(hits)
    }
}

fn index_err(e: lancedb::Error) -> Error {
    Error::Index(e.to_string())
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::Index(format!("column '{name}' missing or has an unexpected type")))
}

fn decode_batch(batch: &RecordBatch, out: &mut Vec<ScoredRecord>) -> Result<()> {
    let address = column::<StringArray>(batch, cols::ADDRESS)?;
    let price = column::<Float64Array>(batch, cols::PRICE)?;
    let bedrooms = column::<Int64Array>(batch, cols::BEDROOMS)?;
    let bathrooms = column::<Int64Array>(batch, cols::BATHROOMS)?;
    let property_type = column::<StringArray>(batch, cols::TYPE)?;
    let description = column::<StringArray>(batch, cols::PROPERTY_TYPE_FULL_DESCRIPTION)?;
    let flood_risk = column::<StringArray>(batch, cols::FLOOD_RISK)?;
    let crime = column::<Float64Array>(batch, cols::CRIME_SCORE)?;
    let new_home = column::<BooleanArray>(batch, cols::IS_NEW_HOME)?;
    let laua = column::<StringArray>(batch, cols::LAUA)?;
    let listed = column::<StringArray>(batch, cols::LISTING_UPDATE_DATE)?;
    let distance = column::<Float32Array>(batch, DISTANCE)?;

    for i in 0..batch.num_rows() {
        out.push(ScoredRecord {
            record: PropertyRecord {
                address: address.value(i).to_string(),
                price: price.value(i),
                bedrooms: bedrooms.value(i),
                bathrooms: bathrooms.value(i),
                property_type: property_type.value(i).to_string(),
                property_type_full_description: description.value(i).to_string(),
                flood_risk: flood_risk.value(i).to_string(),
                crime_score_weight: crime.value(i),
                is_new_home: new_home.value(i),
                laua: laua.value(i).to_string(),
                listing_update_date: listed.value(i).to_string(),
            },
            distance: distance.value(i),
        });
    }
    Ok(())
}
