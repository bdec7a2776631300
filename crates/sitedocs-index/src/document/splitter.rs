use super::types::{Chunk, RawDocument};
use crate::error::IndexError;

/// Chunk size and overlap, both counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] if `chunk_size` is zero or the overlap is
    /// not smaller than the chunk size.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IndexError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits documents into overlapping chunks, cutting at the most natural
/// boundary available inside each window.
///
/// Consecutive chunks of one document share exactly `chunk_overlap`
/// characters, so dropping that prefix from every chunk after the first and
/// concatenating reproduces the document.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] for an invalid configuration.
    pub fn new(config: SplitterConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> SplitterConfig {
        self.config
    }

    #[must_use]
    pub fn split(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    #[must_use]
    pub fn split_document(&self, document: &RawDocument) -> Vec<Chunk> {
        split_chars(
            &document.content,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
        .into_iter()
        .enumerate()
        .map(|(i, content)| Chunk {
            source: document.source.clone(),
            content,
            chunk_index: i,
        })
        .collect()
    }
}

fn split_chars(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        if start + size >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }
        let cut = find_cut(&chars, start + overlap + 1, start + size);
        chunks.push(chars[start..cut].iter().collect());
        start = cut - overlap;
    }

    chunks
}

/// Pick a cut position in `lo..=hi`; the chunk ends just before `cut`.
fn find_cut(chars: &[char], lo: usize, hi: usize) -> usize {
    let after = |pred: &dyn Fn(usize) -> bool| (lo..=hi).rev().find(|&c| pred(c));

    after(&|c| c >= 2 && chars[c - 2] == '\n' && chars[c - 1] == '\n')
        .or_else(|| after(&|c| chars[c - 1] == '\n'))
        .or_else(|| {
            after(&|c| c >= 2 && matches!(chars[c - 2], '.' | '?' | '!') && chars[c - 1] == ' ')
        })
        .or_else(|| after(&|c| chars[c - 1].is_whitespace()))
        .unwrap_or(hi)
}
