use sitedocs_llm::{EmbeddingProvider, LlmError, provider::ensure_count};

/// Default number of texts sent per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Embed `texts` in batches of at most `batch_size`, preserving input order.
///
/// Stops at the first failing batch; nothing is retried here beyond what the
/// provider does for rate limiting.
///
/// # Errors
///
/// Returns the provider's error, or [`LlmError::CountMismatch`] if a batch
/// comes back with the wrong number of vectors.
pub async fn embed_texts<P: EmbeddingProvider>(
    provider: &P,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, LlmError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let out = provider.embed_batch(batch).await?;
        vectors.extend(ensure_count(provider.name(), batch.len(), out)?);
    }
    Ok(vectors)
}
