//! Embedding function contract used by the retrieval index.
//!
//! An [`Embedder`] turns a batch of texts into one vector per text, in input
//! order. Any closure with the matching signature is an embedder, which keeps
//! the index testable without a model server.

mod http;

pub use http::HttpEmbedder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed embedding response: {0}")]
    Malformed(String),

    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

pub trait Embedder: Send + Sync {
    /// Embed every text, returning vectors in the same order.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Malformed("no vector returned for query".to_string()))
    }
}

impl<F> Embedder for F
where
    F: Fn(&[&str]) -> Result<Vec<Vec<f32>>> + Send + Sync,
{
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_embedder() {
        let embedder = |texts: &[&str]| -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        };
        let vectors = embedder.embed(&["a", "abc"]).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0]]);
        assert_eq!(embedder.embed_one("ab").unwrap(), vec![2.0]);
    }

    #[test]
    fn test_embed_one_empty_response() {
        let embedder = |_: &[&str]| -> Result<Vec<Vec<f32>>> { Ok(Vec::new()) };
        assert!(matches!(
            embedder.embed_one("q"),
            Err(EmbeddingError::Malformed(_))
        ));
    }
}
