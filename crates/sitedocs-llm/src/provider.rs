use std::future::Future;

use crate::error::LlmError;

/// A text-embedding backend.
///
/// One instance is bound to exactly one model for its whole lifetime, so every
/// vector it returns lives in the same space. Indexing and querying must go
/// through the same instance.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the service call fails or the response is malformed.
    /// Implementations must not silently retry anything but rate limiting.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Same as [`Self::embed_batch`].
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        let input = vec![text.to_owned()];
        let provider = self.name();
        async move {
            self.embed_batch(&input)
                .await?
                .into_iter()
                .next()
                .ok_or(LlmError::EmptyResponse { provider })
        }
    }

    /// Identifier of the embedding model this instance is bound to.
    fn model_name(&self) -> &str;

    fn name(&self) -> &'static str;
}

/// Check that a backend answered with exactly one vector per input.
///
/// # Errors
///
/// Returns [`LlmError::CountMismatch`] when the counts differ.
pub fn ensure_count(
    provider: &'static str,
    expected: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Vec<Vec<f32>>, LlmError> {
    if vectors.len() == expected {
        Ok(vectors)
    } else {
        Err(LlmError::CountMismatch {
            provider,
            expected,
            got: vectors.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_count_accepts_matching() {
        let v = ensure_count("test", 2, vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn ensure_count_rejects_short_response() {
        let err = ensure_count("test", 3, vec![vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            LlmError::CountMismatch {
                expected: 3,
                got: 1,
                ..
            }
        ));
    }
}
