//! homesearch-embed
//!
//! Text embedders behind [`homesearch_core::traits::Embedder`]: a local
//! sentence encoder on candle and a hashing embedder for tests.
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::info;

use homesearch_core::config::{expand_path, EmbeddingSettings};
use homesearch_core::traits::Embedder;

pub mod device;
pub mod hashing;
pub mod pool;
pub mod sentence;
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use sentence::SentenceEncoder;

/// Embedder selected by settings. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing embedder regardless of configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let forced = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if forced || settings.use_fake {
        info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Box::new(HashingEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Box::new(SentenceEncoder::load(&model_dir, settings.max_len)?))
}

/// `APP_MODEL_DIR`, then `embedding.model_dir`, then `models/all-MiniLM-L6-v2`.
pub fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let candidates = std::env::var("APP_MODEL_DIR")
        .ok()
        .into_iter()
        .chain(settings.model_dir.clone())
        .chain(std::iter::once("models/all-MiniLM-L6-v2".to_string()));
    for candidate in candidates {
        let dir = expand_path(&candidate);
        if dir.exists() {
            info!(dir = %dir.display(), "using model dir");
            return Ok(dir);
        }
    }
    Err(anyhow!(
        "Could not locate a sentence encoder; set embedding.model_dir or APP_MODEL_DIR, \
         or enable embedding.use_fake"
    ))
}
