use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Tokenizes `texts` into `(input_ids, attention_mask)`, both `[batch, len]`
/// where `len` is the longest encoding in the batch capped at `max_len`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let len = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);

    let mut ids = Vec::with_capacity(texts.len() * len);
    let mut mask = Vec::with_capacity(texts.len() * len);
    for enc in &encodings {
        let take = enc.get_ids().len().min(len);
        ids.extend_from_slice(&enc.get_ids()[..take]);
        mask.extend_from_slice(&enc.get_attention_mask()[..take]);
        ids.extend(std::iter::repeat(pad_id).take(len - take));
        mask.extend(std::iter::repeat(0u32).take(len - take));
    }

    let input_ids = Tensor::from_vec(ids, (encodings.len(), len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), len), device)?;
    Ok((input_ids, attention_mask))
}
