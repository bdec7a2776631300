//! Per-project retrieval core: PDF loading, chunking, embedding, an in-memory
//! vector index per project and the registry that builds and caches them.

pub mod builder;
pub mod document;
pub mod embed;
pub mod error;
pub mod project_index;
pub mod registry;
pub mod retriever;

pub use builder::IndexBuilder;
pub use document::{Chunk, DocumentLoader, PdfLoader, RawDocument, SplitterConfig, TextSplitter};
pub use error::IndexError;
pub use project_index::{ProjectIndex, SearchHit};
pub use registry::{IndexRegistry, IndexSource};
pub use retriever::{ContextOutcome, DocumentRetriever, RetrievalConfig, RetrievedChunk};
