//! TOML configuration for chunking, retrieval and the embedding service.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rag::DEFAULT_CHUNK_SIZE;

/// Number of chunks retrieved per question unless overridden.
pub const DEFAULT_TOP_K: usize = 3;

const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

/// Configuration for embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Model identifier (e.g., "text-embedding-3-small")
    pub model: String,
    /// Requested vector size, for models that support truncation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// API key; OpenAI falls back to `OPENAI_API_KEY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Server URL; defaults depend on the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            api_key: None,
            base_url: None,
            batch_size: 64,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_base_url(&self) -> String {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url.clone(),
            (None, EmbeddingProvider::OpenAi) => "https://api.openai.com/v1".to_string(),
            (None, EmbeddingProvider::Ollama) => "http://localhost:11434".to_string(),
        }
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| match self.provider {
                EmbeddingProvider::OpenAi => std::env::var(OPENAI_API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                EmbeddingProvider::Ollama => None,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Characters per chunk
    pub chunk_size: usize,
    /// Chunks retrieved per question
    pub top_k: usize,
    pub embedding: EmbeddingConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RagConfig {
    /// Default config file location (`<config dir>/docrag/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docrag").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path`, or the default location if it exists, or built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".to_string()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model is empty".to_string()));
        }
        Ok(())
    }
}
