//! Blocking embedding client for OpenAI-compatible and Ollama endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, EmbeddingProvider};

use super::{Embedder, EmbeddingError, Result};

/// Embedding client talking to a remote model server.
///
/// Inputs are sent in batches of `batch_size`. Failed requests are not
/// retried; callers decide whether to rebuild.
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    provider: EmbeddingProvider,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
}

impl HttpEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.resolved_api_key() {
            let auth = format!("Bearer {}", key.trim());
            let value = HeaderValue::from_str(&auth)
                .map_err(|_| EmbeddingError::Unavailable("invalid API key".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        } else if config.provider == EmbeddingProvider::OpenAi {
            log::warn!("No API key configured for OpenAI embeddings");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        let base_url = config.resolved_base_url();
        let endpoint = match config.provider {
            EmbeddingProvider::OpenAi => format!("{}/embeddings", base_url.trim_end_matches('/')),
            EmbeddingProvider::Ollama => format!("{}/api/embed", base_url.trim_end_matches('/')),
        };

        Ok(Self {
            client,
            endpoint,
            provider: config.provider,
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        log::debug!(
            "Requesting {} embeddings from {} ({})",
            inputs.len(),
            self.endpoint,
            self.model
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: match self.provider {
                EmbeddingProvider::OpenAi => self.dimensions,
                EmbeddingProvider::Ollama => None,
            },
        };
        let response = self.client.post(&self.endpoint).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let vectors = match self.provider {
            EmbeddingProvider::OpenAi => {
                let parsed: OpenAiResponse = response.json()?;
                openai_vectors(parsed)?
            }
            EmbeddingProvider::Ollama => {
                let parsed: OllamaResponse = response.json()?;
                parsed.embeddings
            }
        };

        if vectors.len() != inputs.len() {
            return Err(EmbeddingError::Malformed(format!(
                "{} embeddings returned for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }

        Ok(vectors)
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch)?);
        }
        Ok(vectors)
    }
}

/// Order OpenAI results by their `index` field, which must cover `0..n`.
fn openai_vectors(mut response: OpenAiResponse) -> Result<Vec<Vec<f32>>> {
    response.data.sort_by_key(|entry| entry.index);
    if let Some((position, entry)) = response
        .data
        .iter()
        .enumerate()
        .find(|(position, entry)| entry.index != *position)
    {
        return Err(EmbeddingError::Malformed(format!(
            "embedding index {} found at position {}",
            entry.index, position
        )));
    }
    Ok(response
        .data
        .into_iter()
        .map(|entry| entry.embedding)
        .collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}
