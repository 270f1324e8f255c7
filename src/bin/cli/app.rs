use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use docrag_lib::config::RagConfig;
use docrag_lib::document::load_document;
use docrag_lib::embeddings::HttpEmbedder;
use docrag_lib::rag::{BuildReport, RetrievalIndex};

/// Shared application state for CLI commands
pub struct App {
    pub config: RagConfig,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = RagConfig::load_or_default(config_path)
            .context("Failed to load configuration")?;
        Ok(Self { config })
    }

    /// Read a document as plain text
    pub fn load_text(&self, file: &Path) -> Result<String> {
        load_document(file).with_context(|| format!("Failed to read {}", file.display()))
    }

    /// Build a retrieval index for `file` with the configured embedder
    pub fn build_index(&self, file: &Path) -> Result<(RetrievalIndex, BuildReport)> {
        let text = self.load_text(file)?;

        let embedder = HttpEmbedder::from_config(&self.config.embedding)
            .context("Failed to create embedding client")?;
        let index = RetrievalIndex::with_chunk_size(Arc::new(embedder), self.config.chunk_size)?;

        let report = index
            .build(&text)
            .with_context(|| format!("Failed to index {}", file.display()))?;
        Ok((index, report))
    }
}
