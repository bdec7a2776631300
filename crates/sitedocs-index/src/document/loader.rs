use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::{DEFAULT_MAX_FILE_SIZE, DocumentError, DocumentLoader, RawDocument, is_pdf_name};

/// Per-page text extraction from PDF bytes.
pub trait PdfExtractor: Send + Sync {
    /// Return the text of every page, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Pdf`] if the bytes cannot be parsed.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError>;
}

/// [`PdfExtractor`] backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))
    }
}

/// Loads every `.pdf` file of a project folder.
pub struct PdfLoader {
    pub max_file_size: u64,
    pub extract_timeout: Duration,
    extractor: Arc<dyn PdfExtractor>,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extract_timeout: Duration::from_secs(60),
            extractor: Arc::new(PdfTextExtractor),
        }
    }
}

impl std::fmt::Debug for PdfLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfLoader")
            .field("max_file_size", &self.max_file_size)
            .field("extract_timeout", &self.extract_timeout)
            .finish_non_exhaustive()
    }
}

impl PdfLoader {
    #[must_use]
    pub fn new(max_file_size: u64, extract_timeout: Duration) -> Self {
        Self {
            max_file_size,
            extract_timeout,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn PdfExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Read and extract one file. `Ok(None)` means the file has no text.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if the file cannot be read, is too large,
    /// fails to parse, or extraction exceeds the timeout.
    pub async fn load_file(&self, path: &Path) -> Result<Option<String>, DocumentError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > self.max_file_size {
            return Err(DocumentError::FileTooLarge(meta.len()));
        }

        let bytes = tokio::fs::read(path).await?;
        let extractor = Arc::clone(&self.extractor);
        let task = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes));

        // On timeout the blocking thread is left to finish on its own.
        let pages = tokio::time::timeout(self.extract_timeout, task)
            .await
            .map_err(|_| DocumentError::Timeout(self.extract_timeout.as_secs()))?
            .map_err(|e| DocumentError::Pdf(format!("extraction task failed: {e}")))??;

        let text = pages.join("\n");
        let text = text.trim();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text.to_owned()))
        }
    }

    async fn load_folder(&self, folder: &Path) -> Result<Vec<RawDocument>, DocumentError> {
        let mut entries = match tokio::fs::read_dir(folder).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(folder = %folder.display(), "project folder does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_pdf_name(&name) {
                continue;
            }
            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => files.push((name, path)),
                Ok(_) => {}
                Err(e) => tracing::warn!(file = %name, error = %e, "skipping unreadable document"),
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::with_capacity(files.len());
        for (name, path) in files {
            match self.load_file(&path).await {
                Ok(Some(content)) => documents.push(RawDocument {
                    source: name,
                    content,
                }),
                Ok(None) => tracing::debug!(file = %name, "document has no extractable text"),
                Err(e) => tracing::warn!(file = %name, error = %e, "skipping unreadable document"),
            }
        }

        tracing::debug!(
            folder = %folder.display(),
            documents = documents.len(),
            "loaded project folder"
        );
        Ok(documents)
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        folder: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDocument>, DocumentError>> + Send + '_>> {
        let folder = folder.to_path_buf();
        Box::pin(async move { self.load_folder(&folder).await })
    }
}

/// Load a project folder with the default [`PdfLoader`].
///
/// # Errors
///
/// Fails only if the folder exists but cannot be listed.
pub async fn load_project_documents(folder: &Path) -> Result<Vec<RawDocument>, DocumentError> {
    PdfLoader::default().load_folder(folder).await
}
