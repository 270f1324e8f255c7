//! In-memory retrieval index with exact nearest-neighbor search.
//!
//! The index pairs each chunk with its embedding and answers top-k queries by
//! brute force over squared L2 distance. Search is O(n * D) per query, which
//! is fine for single documents of a few thousand chunks.
//!
//! Chunks and vectors live together in an immutable snapshot. A build
//! computes a complete new snapshot and swaps it in only on success, so
//! readers see either the old or the new pair, never a mix.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::embeddings::{Embedder, EmbeddingError};

use super::chunker::Chunker;
use super::error::{RagError, Result};
use super::models::{BuildReport, Chunk, IndexStats, ScoredChunk};

/// Chunks with their co-indexed vectors: `vectors[i]` embeds `chunks[i]`.
#[derive(Debug, Default)]
struct Snapshot {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl Snapshot {
    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Retrieval index for one document.
///
/// Safe to share between threads: builds are serialized, and searches run
/// against the last complete snapshot without waiting for a running build.
pub struct RetrievalIndex {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    snapshot: RwLock<Arc<Snapshot>>,
    build_lock: Mutex<()>,
}

impl RetrievalIndex {
    /// Create an empty index that chunks at the default size.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunker: Chunker::default(),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            build_lock: Mutex::new(()),
        }
    }

    pub fn with_chunk_size(embedder: Arc<dyn Embedder>, chunk_size: usize) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(chunk_size)?,
            ..Self::new(embedder)
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunker.size()
    }

    /// Rebuild the index from a document using the injected embedder.
    pub fn build(&self, document_text: &str) -> Result<BuildReport> {
        self.build_with(document_text, self.embedder.as_ref())
    }

    /// Rebuild the index from a document using `embedder`.
    ///
    /// A document with no text empties the index and reports `NoContent`.
    /// Any other failure leaves the previous contents in place.
    pub fn build_with(&self, document_text: &str, embedder: &dyn Embedder) -> Result<BuildReport> {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let chunks = self.chunker.split(document_text);
        if chunks.is_empty() {
            log::warn!("Document produced no chunks; index cleared");
            self.replace(Snapshot::default());
            return Err(RagError::NoContent);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        log::debug!("Embedding {} chunks", texts.len());
        let vectors = embedder.embed(&texts).map_err(|e| {
            log::warn!("Index build failed while embedding: {}", e);
            RagError::EmbeddingFailure(e)
        })?;

        let dimensions = validate_vectors(&vectors, chunks.len()).map_err(|e| {
            log::warn!("Index build rejected: {}", e);
            e
        })?;

        let report = BuildReport {
            chunk_count: chunks.len(),
            dimensions,
        };
        self.replace(Snapshot {
            chunks,
            vectors,
            dimensions,
        });

        log::info!(
            "Built retrieval index: {} chunks, {} dimensions",
            report.chunk_count,
            report.dimensions
        );
        Ok(report)
    }

    /// Top-k chunks nearest to `query_vector`, most similar first.
    ///
    /// An empty index yields no results rather than an error.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search_scored(query_vector, k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Like [`search`](Self::search), but keeps the squared L2 distances.
    pub fn search_scored(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".to_string()));
        }

        let snapshot = self.current();
        if snapshot.is_empty() {
            log::debug!("Search on empty index");
            return Ok(Vec::new());
        }
        if query_vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::InvalidArgument(
                "query vector contains non-finite values".to_string(),
            ));
        }
        if query_vector.len() != snapshot.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: snapshot.dimensions,
                actual: query_vector.len(),
            });
        }

        log::debug!("Searching {} chunks for top {}", snapshot.chunks.len(), k);
        let ranked = nearest(&snapshot.vectors, query_vector, k);

        Ok(ranked
            .into_iter()
            .map(|(ordinal, distance)| ScoredChunk {
                chunk: snapshot.chunks[ordinal].clone(),
                distance,
            })
            .collect())
    }

    /// Embed `query` with the injected embedder and search for it.
    pub fn search_text(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search_text_scored(query, k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    pub fn search_text_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".to_string()));
        }
        // Skip the embedding call when there is nothing to rank
        if self.current().is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_one(query)?;
        self.search_scored(&query_vector, k)
    }

    /// Retrieve the chunks relevant to `query`, rendered as one context block.
    pub fn retrieve_context(&self, query: &str, k: usize) -> Result<String> {
        let chunks = self.search_text(query, k)?;
        Ok(Self::format_context(&chunks))
    }

    /// Render chunks in the given order, each labelled with its 1-based
    /// position in the document and separated by a blank line.
    pub fn format_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|chunk| format!("Chunk {}:\n{}", chunk.display_position(), chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Whether a build has succeeded and the index holds chunks.
    pub fn is_ready(&self) -> bool {
        !self.current().is_empty()
    }

    pub fn len(&self) -> usize {
        self.current().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_ready()
    }

    /// Vector dimension, or `None` while empty.
    pub fn dimensions(&self) -> Option<usize> {
        let snapshot = self.current();
        (!snapshot.is_empty()).then_some(snapshot.dimensions)
    }

    /// Chunks in document order.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.current().chunks.clone()
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.current();
        IndexStats {
            chunk_count: snapshot.chunks.len(),
            dimensions: snapshot.dimensions,
            chunk_size: self.chunker.size(),
        }
    }

    /// Drop all indexed content.
    pub fn clear(&self) {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.replace(Snapshot::default());
    }

    fn current(&self) -> Arc<Snapshot> {
        // The guarded value is only ever swapped whole, so a poisoned lock
        // still holds a consistent snapshot.
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&snapshot)
    }

    fn replace(&self, next: Snapshot) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Arc::new(next);
    }
}

/// Check the embedder returned one non-empty vector per chunk, all the same
/// size. Returns that size.
fn validate_vectors(vectors: &[Vec<f32>], expected_count: usize) -> Result<usize> {
    if vectors.len() != expected_count {
        return Err(RagError::EmbeddingFailure(EmbeddingError::Malformed(format!(
            "{} vectors returned for {} chunks",
            vectors.len(),
            expected_count
        ))));
    }

    let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
    if dimensions == 0 {
        return Err(RagError::EmbeddingFailure(EmbeddingError::Malformed(
            "embedding vectors are empty".to_string(),
        )));
    }

    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(RagError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }

    // Finite inputs keep every distance comparable
    if let Some(position) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(RagError::EmbeddingFailure(EmbeddingError::Malformed(format!(
            "vector {} contains non-finite values",
            position
        ))));
    }

    Ok(dimensions)
}

/// Squared Euclidean distance.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Ranking order: smaller distance first, then lower ordinal.
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

/// The `min(k, n)` vectors closest to `query` as `(ordinal, distance)` pairs.
fn nearest(vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(ordinal, v)| (ordinal, squared_l2(query, v)))
        .collect();

    let k = k.min(scored.len());
    if k == 0 {
        return Vec::new();
    }
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, rank_order);
        scored.truncate(k);
    }
    scored.sort_unstable_by(rank_order);
    scored
}
