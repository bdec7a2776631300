pub mod error;
pub mod loader;
pub mod splitter;
pub mod types;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub use error::DocumentError;
pub use loader::{PdfExtractor, PdfLoader, PdfTextExtractor, load_project_documents};
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, RawDocument};

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Reads every usable document out of one project folder.
///
/// A missing folder is an empty project, not an error. Per-file failures are
/// logged and skipped; only a folder that exists but cannot be listed fails.
pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        folder: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawDocument>, DocumentError>> + Send + '_>>;
}

/// Resolve the documents folder for a project display name.
///
/// Characters other than alphanumerics and `. _ -` or space are replaced with
/// `_` and the result is trimmed, so `"ЖК Север/2"` maps to `"ЖК Север_2"`.
/// Names that would resolve to the base folder or its parent (empty, `.`,
/// `..`) are turned into underscores.
#[must_use]
pub fn project_dir(base: &Path, project: &str) -> PathBuf {
    base.join(sanitize_project_name(project))
}

#[must_use]
pub fn sanitize_project_name(project: &str) -> String {
    let name = project
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_owned();
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len().max(1));
    }
    name
}

/// `true` for file names ending in `.pdf`, any case.
#[must_use]
pub fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}
