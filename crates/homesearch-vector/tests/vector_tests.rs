use tempfile::TempDir;

use homesearch_core::error::Error;
use homesearch_core::traits::{Embedder, VectorIndex};
use homesearch_core::types::PropertyRecord;
use homesearch_embed::HashingEmbedder;
use homesearch_vector::{LancePropertyIndexer, LanceVectorIndex};

const DIM: usize = 64;

fn listing(address: &str, kind: &str, bedrooms: i64, laua: &str) -> PropertyRecord {
    PropertyRecord {
        address: address.to_string(),
        price: 100000.0 * bedrooms as f64,
        bedrooms,
        bathrooms: 1,
        property_type: kind.to_string(),
        property_type_full_description: format!("{bedrooms} bed {}", kind.to_lowercase()),
        flood_risk: "Low".to_string(),
        crime_score_weight: 1.5,
        is_new_home: bedrooms % 2 == 0,
        laua: laua.to_string(),
        listing_update_date: "2024-03-01".to_string(),
    }
}

fn build_index(dir: &std::path::Path, records: &[PropertyRecord]) -> usize {
    let embedder = HashingEmbedder::new(DIM);
    let texts: Vec<String> = records.iter().map(PropertyRecord::embedding_text).collect();
    let embeddings = embedder.embed_batch(&texts).expect("embed");
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    rt.block_on(async {
        let indexer = LancePropertyIndexer::new(dir, "properties", DIM).await?;
        indexer.rebuild(records, &embeddings).await
    })
    .expect("index")
}

#[test]
fn nearest_listing_is_returned_first_with_full_record() {
    let tmp = TempDir::new().unwrap();
    let records = vec![
        listing("1 Mill Lane", "Flat", 1, "Leeds"),
        listing("22 Orchard Close", "Detached", 4, "York"),
        listing("5 Harbour View", "Terraced", 3, "Hull"),
    ];
    assert_eq!(build_index(tmp.path(), &records), 3);

    let index = LanceVectorIndex::open(tmp.path(), "properties").expect("open");
    assert_eq!(index.count_rows().expect("count"), 3);

    let query = HashingEmbedder::new(DIM).embed_text(&records[1].embedding_text());
    let hits = index.search_vec(&query, 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].record, records[1]);
    assert!(hits[0].distance <= hits[1].distance);
    assert!(hits[0].distance < 1e-4);
}

#[test]
fn rebuild_replaces_previous_contents() {
    let tmp = TempDir::new().unwrap();
    build_index(tmp.path(), &[listing("1 Mill Lane", "Flat", 1, "Leeds"), listing("2 Mill Lane", "Flat", 2, "Leeds")]);
    build_index(tmp.path(), &[listing("9 New Road", "House", 3, "Bath")]);

    let index = LanceVectorIndex::open(tmp.path(), "properties").expect("open");
    assert_eq!(index.count_rows().expect("count"), 1);
    let query = HashingEmbedder::new(DIM).embed_text("house in bath");
    let hits = index.search_vec(&query, 20).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.address, "9 New Road");
}

#[test]
fn missing_table_is_a_startup_error() {
    let tmp = TempDir::new().unwrap();
    build_index(tmp.path(), &[listing("1 Mill Lane", "Flat", 1, "Leeds")]);
    let err = LanceVectorIndex::open(tmp.path(), "other").err().expect("missing table");
    assert!(matches!(err, Error::NotFound(_)));

    let err = LanceVectorIndex::open(&tmp.path().join("nowhere"), "properties").err().expect("missing dir");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn mismatched_embeddings_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let result = rt.block_on(async {
        let indexer = LancePropertyIndexer::new(tmp.path(), "properties", DIM).await?;
        indexer.rebuild(&[listing("1 Mill Lane", "Flat", 1, "Leeds")], &[vec![0.0; DIM - 1]]).await
    });
    assert!(result.is_err());
}

#[test]
fn rebuild_on_one_connection_drops_only_its_own_table() {
    let tmp = TempDir::new().unwrap();
    let embedder = HashingEmbedder::new(DIM);
    let embed = |records: &[PropertyRecord]| {
        let texts: Vec<String> = records.iter().map(PropertyRecord::embedding_text).collect();
        embedder.embed_batch(&texts).expect("embed")
    };
    let first = vec![listing("1 Mill Lane", "Flat", 1, "Leeds"), listing("2 Mill Lane", "Flat", 2, "Leeds")];
    let second = vec![listing("9 New Road", "House", 3, "Bath")];
    let archive = vec![listing("7 Old Yard", "Bungalow", 2, "Ely")];

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let other = LancePropertyIndexer::new(tmp.path(), "archive", DIM).await?;
        other.rebuild(&archive, &embed(&archive)).await?;

        let indexer = LancePropertyIndexer::new(tmp.path(), "properties", DIM).await?;
        indexer.rebuild(&first, &embed(&first)).await?;
        indexer.rebuild(&second, &embed(&second)).await
    })
    .expect("index");

    let index = LanceVectorIndex::open(tmp.path(), "properties").expect("open");
    assert_eq!(index.count_rows().expect("count"), 1);
    let archive_index = LanceVectorIndex::open(tmp.path(), "archive").expect("open archive");
    assert_eq!(archive_index.count_rows().expect("count"), 1);
}
