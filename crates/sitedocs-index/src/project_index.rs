use crate::document::Chunk;
use crate::error::{IndexError, Result};

/// Flat in-memory vector index over one project's chunks.
///
/// Built once from a full load-and-embed pass and never mutated; a corpus
/// change means building a new index.
#[derive(Debug)]
pub struct ProjectIndex {
    project: String,
    model: String,
    dims: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

/// One search result, borrowed from the index.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

impl ProjectIndex {
    /// Pair each chunk with the vector at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Build`] if the counts differ, there are no chunks,
    /// or the vectors do not share one non-zero dimensionality.
    pub fn build(
        project: impl Into<String>,
        model: impl Into<String>,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::Build(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        let Some(first) = vectors.first() else {
            return Err(IndexError::Build("no chunks to index".into()));
        };
        let dims = first.len();
        if dims == 0 {
            return Err(IndexError::Build("embedding vectors are empty".into()));
        }
        if let Some(pos) = vectors.iter().position(|v| v.len() != dims) {
            return Err(IndexError::Build(format!(
                "vector {pos} has {} dimensions, expected {dims}",
                vectors[pos].len()
            )));
        }

        Ok(Self {
            project: project.into(),
            model: model.into(),
            dims,
            chunks,
            vectors,
        })
    }

    /// Exact cosine-similarity search.
    ///
    /// Returns at most `k` hits by non-increasing score; equal scores keep
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if `query` does not match the
    /// index dimensionality.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                got: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .chunks
            .iter()
            .zip(&self.vectors)
            .map(|(chunk, vector)| SearchHit {
                chunk,
                score: cosine_similarity(query, vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Embedding model the vectors were computed with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn dims(&self) -> usize {
        self.dims
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always false; an index over nothing is never built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Distinct source filenames, in insertion order.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for chunk in &self.chunks {
            if !seen.contains(&chunk.source.as_str()) {
                seen.push(chunk.source.as_str());
            }
        }
        seen
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_nan() { 0.0 } else { score }
}
