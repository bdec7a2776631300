#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;
use crate::provider::EmbeddingProvider;

/// Generates a match over every `AnyEmbedder` variant, binding the inner
/// backend to `$p` and evaluating `$expr`.
macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::OpenAi($p) => $expr,
            AnyEmbedder::Ollama($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

/// Embedding backend selected at startup from configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    OpenAi(OpenAiEmbedder),
    Ollama(OllamaEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, crate::LlmError> {
        delegate_embedder!(self, |p| p.embed_batch(texts).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        delegate_embedder!(self, |p| p.embed(text).await)
    }

    fn model_name(&self) -> &str {
        delegate_embedder!(self, |p| p.model_name())
    }

    fn name(&self) -> &'static str {
        delegate_embedder!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn delegates_identity_to_openai() {
        let any = AnyEmbedder::OpenAi(OpenAiEmbedder::new(
            "k".into(),
            crate::openai::DEFAULT_BASE_URL.into(),
            "text-embedding-3-large".into(),
            Duration::from_secs(5),
        ));
        assert_eq!(any.name(), "openai");
        assert_eq!(any.model_name(), "text-embedding-3-large");
    }

    #[test]
    fn delegates_identity_to_ollama() {
        let any = AnyEmbedder::Ollama(OllamaEmbedder::new(
            crate::ollama::DEFAULT_BASE_URL,
            "nomic-embed-text".into(),
            Duration::from_secs(5),
        )
        .unwrap());
        assert_eq!(any.name(), "ollama");
        assert_eq!(any.model_name(), "nomic-embed-text");
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn delegates_embedding_to_mock() {
        let mock = MockEmbedder::default();
        let any = AnyEmbedder::Mock(mock.clone());
        let v = any.embed_batch(&["a".into()]).await.unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(mock.calls(), 1);
    }
}
