/// Extracted text of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File name, used verbatim as the citation label.
    pub source: String,
    pub content: String,
}

/// A bounded slice of a [`RawDocument`], the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: String,
    pub content: String,
    /// Position within the source document.
    pub chunk_index: usize,
}
