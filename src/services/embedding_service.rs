use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{Config, EmbeddingBackend};
use crate::errors::AppError;

pub const HASHING_DIMENSION: usize = 384;

// Gemini's OpenAI-compatible endpoint rejects larger embedding batches.
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("embedding service failure: {0}")]
    Service(String),

    #[error("embedding call timed out after {0}s")]
    Timeout(u64),

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl From<OpenAIError> for EmbeddingError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => EmbeddingError::Service(api.message),
            other => EmbeddingError::Service(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        AppError::ModelUnavailable(err.to_string())
    }
}

/// Maps text to fixed-dimension vectors. One vector per input, in input order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

pub fn build_embedding_provider(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match config.embedding_backend {
        EmbeddingBackend::Local => Arc::new(HashingEmbedder::default()),
        EmbeddingBackend::Remote => Arc::new(OpenAiEmbeddingProvider::new(config)),
    }
}

/// In-process feature-hashing embedder. Word unigrams and bigrams are hashed
/// into a signed bucket vector which is then L2-normalised, so texts sharing
/// vocabulary land close together under cosine similarity.
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
        for feature in tokens.iter().cloned().chain(bigrams) {
            let hash = fnv1a(feature.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}

// FNV-1a keeps bucket assignment stable across runs and toolchains.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingReply {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embeddings from an OpenAI-compatible endpoint.
pub struct OpenAiEmbeddingProvider {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.model_api_key.expose_secret())
            .with_api_base(&config.model_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.embedding_model.clone(),
            timeout: Duration::from_secs(config.model_timeout_secs),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        log::debug!("Embedding {} texts with {}", texts.len(), self.model);
        embed_in_batches(texts, MAX_BATCH_SIZE, |batch| self.embed_batch(batch)).await
    }
}

impl OpenAiEmbeddingProvider {
    async fn embed_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = batch.len();
        let request = json!({
            "model": self.model,
            "input": batch,
        });

        let embeddings = self.client.embeddings();
        let call = embeddings.create_byot(request);
        let reply: EmbeddingReply = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| EmbeddingError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                log::error!("Embedding call failed: {}", e);
                EmbeddingError::from(e)
            })?;

        order_embeddings(reply, expected)
    }
}

/// Sends `texts` through `embed_batch` at most `batch_size` at a time and
/// concatenates the results in input order.
async fn embed_in_batches<F, Fut>(
    texts: Vec<String>,
    batch_size: usize,
    mut embed_batch: F,
) -> Result<Vec<Vec<f32>>, EmbeddingError>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>>,
{
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        vectors.extend(embed_batch(batch.to_vec()).await?);
    }
    Ok(vectors)
}

fn order_embeddings(reply: EmbeddingReply, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if reply.data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: reply.data.len(),
        });
    }

    let mut data = reply.data;
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
