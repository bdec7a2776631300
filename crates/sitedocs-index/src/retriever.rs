//! Query-time entry point: project + question in, labelled context out.

use std::fmt::Write;
use std::sync::Arc;

use sitedocs_llm::EmbeddingProvider;

use crate::builder::IndexBuilder;
use crate::error::{IndexError, Result};
use crate::registry::IndexRegistry;

/// Retrieval configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// A retrieved chunk with its source attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub source: String,
    pub content: String,
    pub score: f32,
}

/// Answers retrieval queries against per-project indices.
///
/// Constructed from the [`IndexBuilder`] so the query embedder is the same
/// provider instance that produced the indexed vectors.
pub struct DocumentRetriever<P: EmbeddingProvider> {
    registry: IndexRegistry,
    provider: Arc<P>,
    config: RetrievalConfig,
}

impl<P: EmbeddingProvider> std::fmt::Debug for DocumentRetriever<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRetriever")
            .field("registry", &self.registry)
            .field("model", &self.provider.model_name())
            .field("config", &self.config)
            .finish()
    }
}

impl<P: EmbeddingProvider + 'static> DocumentRetriever<P> {
    #[must_use]
    pub fn new(builder: Arc<IndexBuilder<P>>, config: RetrievalConfig) -> Self {
        let provider = Arc::clone(builder.provider());
        Self {
            registry: IndexRegistry::new(builder),
            provider,
            config,
        }
    }
}

impl<P: EmbeddingProvider> DocumentRetriever<P> {
    #[must_use]
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Top matches for `query` in the project's documents, most relevant
    /// first. Empty when the project has no documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the index build or the query embedding fails, or
    /// if the index was built with a different embedding model.
    pub async fn retrieve(&self, project: &str, query: &str) -> Result<Vec<RetrievedChunk>> {
        let Some(index) = self.registry.get_or_build(project).await? else {
            tracing::debug!(project, "no index for project");
            return Ok(Vec::new());
        };

        if index.model() != self.provider.model_name() {
            return Err(IndexError::ModelMismatch {
                index: index.model().to_owned(),
                provider: self.provider.model_name().to_owned(),
            });
        }

        let query_vector = self.provider.embed(query).await?;
        let hits = index.search(&query_vector, self.config.top_k)?;

        tracing::debug!(project, hits = hits.len(), "retrieved context");
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                source: hit.chunk.source.clone(),
                content: hit.chunk.content.clone(),
                score: hit.score,
            })
            .collect())
    }

    /// Context string for the LLM prompt, or `None` when the project has no
    /// documentation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::retrieve`].
    pub async fn get_relevant_context(&self, project: &str, query: &str) -> Result<Option<String>> {
        let chunks = self.retrieve(project, query).await?;
        if chunks.is_empty() {
            return Ok(None);
        }
        Ok(Some(format_context(&chunks)))
    }

    /// Rebuild the named projects, returning how many produced an index.
    pub async fn rebuild_all<S: AsRef<str>>(&self, projects: &[S]) -> usize {
        self.registry.rebuild_all(projects).await
    }
}

/// Join chunks into labelled sections separated by a blank line.
#[must_use]
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "--- FROM DOCUMENT: {} ---\n{}",
            chunk.source, chunk.content
        );
    }
    out
}

/// What the end user gets for a documentation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOutcome {
    Context(String),
    NoDocuments,
    Unavailable,
}

impl ContextOutcome {
    /// Collapse a retrieval result into a user-facing outcome. Error detail is
    /// logged here and never carried further.
    #[must_use]
    pub fn from_result(result: Result<Option<String>>) -> Self {
        match result {
            Ok(Some(context)) => Self::Context(context),
            Ok(None) => Self::NoDocuments,
            Err(e) => {
                tracing::warn!(error = %e, "document retrieval failed");
                Self::Unavailable
            }
        }
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Context(context) => Some(context),
            _ => None,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Context(context) => context,
            Self::NoDocuments => "No project documentation is available for this question.",
            Self::Unavailable => {
                "The documentation service is temporarily unavailable. Please try again later."
            }
        }
    }
}
