//! Chunked vector retrieval for document question answering.
//!
//! A document is split into fixed-size chunks, each chunk is embedded by an
//! injected [`embeddings::Embedder`], and [`rag::RetrievalIndex`] answers
//! exact top-k nearest-neighbor queries over the resulting vectors.

pub mod config;
pub mod document;
pub mod embeddings;
pub mod rag;

pub use config::RagConfig;
pub use embeddings::{Embedder, EmbeddingError, HttpEmbedder};
pub use rag::{Chunk, RagError, RetrievalIndex, ScoredChunk};
