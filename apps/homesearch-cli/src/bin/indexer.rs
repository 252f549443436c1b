use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use homesearch_core::config::{expand_path, Config};
use homesearch_core::data_processor::DataProcessor;
use homesearch_embed::get_default_embedder;
use homesearch_store::SqliteStore;
use homesearch_vector::LancePropertyIndexer;

const EMBED_BATCH: usize = 256;

/// Build the SQLite table and the vector index from the listings CSV.
#[derive(Parser)]
#[command(name = "homesearch-indexer")]
#[command(version)]
struct Args {
    /// Listings CSV (default: data.csv_path from config)
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = Config::load().context("loading configuration")?.settings()?;
    let csv_path = args.csv.unwrap_or_else(|| expand_path(&settings.data.csv_path));
    let sqlite_path = expand_path(&settings.data.sqlite_path);
    let lancedb_dir = expand_path(&settings.data.lancedb_dir);

    println!("🏠 HomeSearch Indexer\n====================");
    println!("CSV: {}", csv_path.display());

    let records = DataProcessor::new().load_csv(&csv_path)?;

    let store = SqliteStore::create(&sqlite_path, &settings.data.table_name)?;
    let written = store.replace_table(&records)?;
    println!("📊 Wrote {} listings to {} ({})", written, sqlite_path.display(), settings.data.table_name);

    let embedder = get_default_embedder(&settings.embedding)?;
    let texts: Vec<String> = records.iter().map(|r| r.embedding_text()).collect();
    info!(count = texts.len(), dim = embedder.dim(), "embedding listings");
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedded ({percent}%)")?
            .progress_chars("#>-"),
    );
    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(EMBED_BATCH) {
        embeddings.extend(embedder.embed_batch(batch)?);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let rt = tokio::runtime::Runtime::new()?;
    let indexed = rt.block_on(async {
        let indexer = LancePropertyIndexer::new(&lancedb_dir, &settings.data.vector_table, embedder.dim()).await?;
        indexer.rebuild(&records, &embeddings).await
    })?;

    println!("\n✅ Indexing completed successfully!");
    println!("📊 Indexed {} listings into LanceDB at {}", indexed, lancedb_dir.display());
    println!("\n💡 To ask a question, use: cargo run --bin homesearch -- query '<question>'");
    Ok(())
}
