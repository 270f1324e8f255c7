//! Fixed-size text chunking for RAG indexing.
//!
//! Sizes are counted in Unicode scalar values (`char`s), never bytes, so a
//! chunk boundary can't split a multi-byte character.

use super::error::{RagError, Result};
use super::models::Chunk;

/// Default number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Split `text` into consecutive, non-overlapping chunks of `size` characters.
///
/// The last chunk may be shorter than `size`. Empty text yields no chunks.
pub fn split(text: &str, size: usize) -> Result<Vec<Chunk>> {
    if size == 0 {
        return Err(RagError::InvalidArgument(
            "chunk size must be greater than zero".to_string(),
        ));
    }

    let mut chunks = Vec::with_capacity(estimate_chunk_count(text, size));
    let mut start = 0;
    let mut taken = 0;

    for (offset, _) in text.char_indices() {
        if taken == size {
            chunks.push(Chunk::new(&text[start..offset], chunks.len()));
            start = offset;
            taken = 0;
        }
        taken += 1;
    }

    if start < text.len() {
        chunks.push(Chunk::new(&text[start..], chunks.len()));
    }

    Ok(chunks)
}

/// Chunker bound to a fixed chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Chunker {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(RagError::InvalidArgument(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // size is validated at construction
        split(text, self.size).unwrap_or_default()
    }
}

/// Upper bound on the number of chunks, from the byte length.
fn estimate_chunk_count(text: &str, size: usize) -> usize {
    text.len().div_ceil(size)
}
