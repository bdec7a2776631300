use std::path::Path;

use anyhow::Context;
use sitedocs_index::document::is_pdf_name;

/// A project folder found under the documents directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFolder {
    pub name: String,
    pub pdf_count: usize,
}

/// List the subdirectories of `documents_dir` with their PDF counts, sorted by
/// name. A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub async fn list_project_folders(documents_dir: &Path) -> anyhow::Result<Vec<ProjectFolder>> {
    let mut entries = match tokio::fs::read_dir(documents_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to read documents dir {}", documents_dir.display())
            });
        }
    };

    let mut folders = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        folders.push(ProjectFolder {
            name: entry.file_name().to_string_lossy().into_owned(),
            pdf_count: count_pdfs(&entry.path()).await,
        });
    }
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}

async fn count_pdfs(folder: &Path) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(folder).await else {
        return 0;
    };
    let mut count = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if is_pdf_name(&entry.file_name().to_string_lossy())
            && entry.file_type().await.is_ok_and(|t| t.is_file())
        {
            count += 1;
        }
    }
    count
}
