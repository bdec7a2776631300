use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use sitedocs_llm::EmbeddingProvider;

use crate::document::{DocumentLoader, TextSplitter, project_dir};
use crate::embed::{DEFAULT_BATCH_SIZE, embed_texts};
use crate::error::{IndexError, Result};
use crate::project_index::ProjectIndex;
use crate::registry::IndexSource;

/// Runs the full load, split, embed and index pass for one project.
pub struct IndexBuilder<P: EmbeddingProvider> {
    loader: Arc<dyn DocumentLoader>,
    splitter: TextSplitter,
    provider: Arc<P>,
    documents_dir: PathBuf,
    batch_size: usize,
    build_timeout: Duration,
}

impl<P: EmbeddingProvider> std::fmt::Debug for IndexBuilder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("splitter", &self.splitter)
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model_name())
            .field("documents_dir", &self.documents_dir)
            .field("batch_size", &self.batch_size)
            .field("build_timeout", &self.build_timeout)
            .finish_non_exhaustive()
    }
}

impl<P: EmbeddingProvider> IndexBuilder<P> {
    #[must_use]
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        splitter: TextSplitter,
        provider: Arc<P>,
        documents_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            loader,
            splitter,
            provider,
            documents_dir: documents_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            build_timeout: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// The embedding provider shared by indexing and querying.
    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    #[must_use]
    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    #[must_use]
    pub fn project_dir(&self, project: &str) -> PathBuf {
        project_dir(&self.documents_dir, project)
    }

    /// Build a fresh index, bounded by the build timeout.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Timeout`] if the pass exceeds the timeout, or the
    /// loader, embedding or index error that stopped it.
    pub async fn build_project(&self, project: &str) -> Result<Option<ProjectIndex>> {
        tokio::time::timeout(self.build_timeout, self.build_inner(project))
            .await
            .map_err(|_| IndexError::Timeout {
                project: project.to_owned(),
                secs: self.build_timeout.as_secs(),
            })?
    }

    async fn build_inner(&self, project: &str) -> Result<Option<ProjectIndex>> {
        let started = Instant::now();
        let folder = self.project_dir(project);
        tracing::info!(project, folder = %folder.display(), "building project index");

        let documents = self.loader.load(&folder).await?;
        if documents.is_empty() {
            tracing::info!(project, "no documents found");
            return Ok(None);
        }

        let chunks = self.splitter.split(&documents);
        if chunks.is_empty() {
            return Ok(None);
        }
        tracing::info!(
            project,
            documents = documents.len(),
            chunks = chunks.len(),
            "documents split"
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embed_texts(self.provider.as_ref(), &texts, self.batch_size).await?;
        let index = ProjectIndex::build(project, self.provider.model_name(), chunks, vectors)?;

        tracing::info!(
            project,
            chunks = index.len(),
            dims = index.dims(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "project index built"
        );
        Ok(Some(index))
    }
}

impl<P: EmbeddingProvider> IndexSource for IndexBuilder<P> {
    fn build<'a>(&'a self, project: &'a str) -> BoxFuture<'a, Result<Option<ProjectIndex>>> {
        self.build_project(project).boxed()
    }
}
