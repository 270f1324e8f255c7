//! Data models for RAG operations.

use serde::{Deserialize, Serialize};

/// A contiguous slice of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// The text content of the chunk
    pub text: String,
    /// Position of this chunk within the document, starting at 0
    pub ordinal: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, ordinal: usize) -> Self {
        Self {
            text: text.into(),
            ordinal,
        }
    }

    /// 1-based position used when rendering context.
    pub fn display_position(&self) -> usize {
        self.ordinal + 1
    }
}

/// A search hit together with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Squared Euclidean distance (lower is more similar)
    pub distance: f32,
}

/// Outcome of a successful index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub chunk_count: usize,
    pub dimensions: usize,
}

/// Statistics about the retrieval index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub chunk_count: usize,
    /// Zero while the index is empty
    pub dimensions: usize,
    pub chunk_size: usize,
}
