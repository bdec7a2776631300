//! Startup wiring: config file to embedding provider to retriever.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use sitedocs_index::document::project_dir;
use sitedocs_index::{DocumentRetriever, IndexBuilder, PdfLoader, RetrievalConfig, TextSplitter};
use sitedocs_llm::AnyEmbedder;
use sitedocs_llm::ollama::OllamaEmbedder;
use sitedocs_llm::openai::OpenAiEmbedder;

use crate::config::{Config, EmbeddingProviderKind};
use crate::vault::{EnvVaultProvider, VaultProvider};

/// Priority: CLI `--config` > `SITEDOCS_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SITEDOCS_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Construct the embedding backend named by the configuration.
///
/// # Errors
///
/// Returns an error if the selected backend is missing its credentials or is
/// not compiled in.
pub fn create_embedder(config: &Config) -> anyhow::Result<AnyEmbedder> {
    let timeout = Duration::from_secs(config.timeouts.embedding_seconds);
    let model = config.embedding.model.clone();

    match config.embedding.provider {
        EmbeddingProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("OpenAI API key not found (set SITEDOCS_OPENAI_API_KEY or OPENAI_API_KEY)")?;
            let base_url = config
                .embedding
                .base_url
                .clone()
                .unwrap_or_else(|| sitedocs_llm::openai::DEFAULT_BASE_URL.to_owned());
            Ok(AnyEmbedder::OpenAi(
                OpenAiEmbedder::new(api_key.expose().to_owned(), base_url, model, timeout)
                    .with_max_retries(config.embedding.max_retries),
            ))
        }
        EmbeddingProviderKind::Ollama => {
            let base_url = config
                .embedding
                .base_url
                .as_deref()
                .unwrap_or(sitedocs_llm::ollama::DEFAULT_BASE_URL);
            Ok(AnyEmbedder::Ollama(OllamaEmbedder::new(base_url, model, timeout)))
        }
        #[cfg(feature = "mock")]
        EmbeddingProviderKind::Mock => Ok(AnyEmbedder::Mock(
            sitedocs_llm::mock::MockEmbedder::default().with_model(model),
        )),
        #[cfg(not(feature = "mock"))]
        EmbeddingProviderKind::Mock => bail!("mock embedding provider requires the `mock` feature"),
    }
}

/// Wire loader, splitter, builder and registry around `embedder`.
///
/// # Errors
///
/// Returns an error if `documents_dir` is unset or the chunking settings are
/// invalid.
pub fn build_retriever(
    config: &Config,
    embedder: AnyEmbedder,
) -> anyhow::Result<DocumentRetriever<AnyEmbedder>> {
    let Some(documents_dir) = config.documents_dir.clone() else {
        bail!("documents_dir is not configured (set it in the config file or SITEDOCS_DOCUMENTS_DIR)");
    };

    let splitter = TextSplitter::new(config.splitter_config())?;
    let loader = PdfLoader::new(
        config.index.max_file_size,
        Duration::from_secs(config.index.extract_timeout_seconds),
    );
    let builder = IndexBuilder::new(Arc::new(loader), splitter, Arc::new(embedder), documents_dir)
        .with_batch_size(config.embedding.batch_size)
        .with_build_timeout(Duration::from_secs(config.index.build_timeout_seconds));

    Ok(DocumentRetriever::new(
        Arc::new(builder),
        RetrievalConfig {
            top_k: config.retrieval.top_k,
        },
    ))
}

/// Loaded configuration plus the retriever built from it.
pub struct App {
    pub config: Config,
    pub retriever: DocumentRetriever<AnyEmbedder>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("retriever", &self.retriever)
            .finish()
    }
}

impl App {
    /// Load config from `path`, resolve secrets from the environment and
    /// build the retriever.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the setup fails.
    pub async fn bootstrap(path: &Path) -> anyhow::Result<Self> {
        let config = Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Self::from_config(config, &EnvVaultProvider).await
    }

    /// # Errors
    ///
    /// Returns an error if secrets cannot be resolved or the retriever cannot
    /// be built.
    pub async fn from_config(mut config: Config, vault: &dyn VaultProvider) -> anyhow::Result<Self> {
        config.resolve_secrets(vault).await?;
        let embedder = create_embedder(&config)?;
        tracing::info!(
            provider = config.embedding.provider.as_str(),
            model = %config.embedding.model,
            "embedding provider ready"
        );
        let retriever = build_retriever(&config, embedder)?;
        Ok(Self { config, retriever })
    }

    /// Folder that holds a project's PDFs.
    #[must_use]
    pub fn project_dir(&self, project: &str) -> Option<PathBuf> {
        self.config
            .documents_dir
            .as_deref()
            .map(|base| project_dir(base, project))
    }
}
