//! Error types for sitedocs-index.

use std::sync::Arc;

use crate::document::DocumentError;

/// Errors raised while building or querying a project index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The embedding service call failed.
    #[error("embedding service error: {0}")]
    Embedding(#[from] sitedocs_llm::LlmError),

    /// The project folder could not be listed.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Internal invariant violated while assembling an index.
    #[error("index build failed: {0}")]
    Build(String),

    /// Chunking or retrieval parameters are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("index build for '{project}' timed out after {secs}s")]
    Timeout { project: String, secs: u64 },

    #[error("query vector has {got} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("index was built with model '{index}', query provider uses '{provider}'")]
    ModelMismatch { index: String, provider: String },

    /// Failure of a build whose result was shared between concurrent callers.
    #[error(transparent)]
    Shared(Arc<IndexError>),
}

impl IndexError {
    /// Whether the failure came from the external embedding service,
    /// looking through shared build results.
    #[must_use]
    pub fn is_embedding(&self) -> bool {
        match self {
            Self::Embedding(_) => true,
            Self::Shared(inner) => inner.is_embedding(),
            _ => false,
        }
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
