//! RAG (Retrieval-Augmented Generation) module: document chunking and
//! nearest-neighbor retrieval of chunks for LLM context.

mod chunker;
mod error;
mod index;
mod models;

pub use chunker::{split, Chunker, DEFAULT_CHUNK_SIZE};
pub use error::{RagError, Result};
pub use index::RetrievalIndex;
pub use models::{BuildReport, Chunk, IndexStats, ScoredChunk};
