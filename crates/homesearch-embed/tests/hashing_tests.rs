use homesearch_core::config::EmbeddingSettings;
use homesearch_core::traits::Embedder;
use homesearch_embed::{get_default_embedder, HashingEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hashing_embedder_is_deterministic_and_normalized() {
    let embedder = HashingEmbedder::new(64);
    let texts = vec!["Two bed flat in Camden".to_string(), "two bed flat in camden".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed");
    assert_eq!(embs.len(), 2);
    assert_eq!(embs[0].len(), 64);
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "norm={norm}");
    for (a, b) in embs[0].iter().zip(&embs[1]) {
        assert!((a - b).abs() <= 1e-6, "case is ignored");
    }
}

#[test]
fn shared_words_are_closer() {
    let e = HashingEmbedder::new(256);
    let q = e.embed_text("quiet family house with garden");
    let near = e.embed_text("family house with a big garden");
    let far = e.embed_text("studio flat above shop");
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn settings_select_hashing_embedder() {
    let settings = EmbeddingSettings { use_fake: true, fake_dim: 32, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 32);
    assert_eq!(embedder.embed_batch(&["x".to_string()]).expect("embed")[0].len(), 32);
}
