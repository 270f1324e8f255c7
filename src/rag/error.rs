use thiserror::Error;

use crate::embeddings::EmbeddingError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document produced no content to index")]
    NoContent,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    EmbeddingFailure(#[from] EmbeddingError),
}

pub type Result<T> = std::result::Result<T, RagError>;
