use std::env;
use std::str::FromStr;

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

const DEFAULT_MODEL_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// In-process hashing embedder, no network access.
    Local,
    /// OpenAI-compatible embeddings endpoint on the model service.
    Remote,
}

impl FromStr for EmbeddingBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(EmbeddingBackend::Local),
            "remote" => Ok(EmbeddingBackend::Remote),
            other => Err(AppError::Configuration(format!(
                "EMBEDDING_PROVIDER must be 'local' or 'remote', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub model_api_key: SecretString,
    pub model_api_base: String,
    pub model_name: String,
    pub model_timeout_secs: u64,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub session_ttl_secs: u64,
    pub max_sessions: u64,
    pub context_ttl_secs: u64,
    pub max_contexts: u64,
    pub max_upload_bytes: usize,
    pub web_server_host: String,
    pub web_server_port: u16,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let model_api_key = non_blank_var("GEMINI_API_KEY")
            .or_else(|| non_blank_var("MODEL_API_KEY"))
            .ok_or_else(|| {
                AppError::Configuration(
                    "GEMINI_API_KEY (or MODEL_API_KEY) must be set".to_string(),
                )
            })?;

        let embedding_backend = match env::var("EMBEDDING_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => EmbeddingBackend::Local,
        };

        let config = Self {
            model_api_key: SecretString::from(model_api_key),
            model_api_base: env::var("MODEL_API_BASE")
                .unwrap_or_else(|_| DEFAULT_MODEL_API_BASE.to_string()),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            model_timeout_secs: parse_or("MODEL_TIMEOUT_SECS", 60),
            embedding_backend,
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            chunk_size: parse_or("CHUNK_SIZE", 512),
            chunk_overlap: parse_or("CHUNK_OVERLAP", 50),
            session_ttl_secs: parse_or("SESSION_TTL_SECS", 3600),
            max_sessions: parse_or("MAX_SESSIONS", 10_000),
            context_ttl_secs: parse_or("CONTEXT_TTL_SECS", 86_400),
            max_contexts: parse_or("MAX_CONTEXTS", 1_000),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: parse_or("WEB_SERVER_PORT", 8000),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make ingestion loop or produce empty chunks.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Configuration(
                "CHUNK_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn test_config() -> Self {
        Self {
            model_api_key: SecretString::from("test-model-key".to_string()),
            model_api_base: "http://127.0.0.1:9".to_string(),
            model_name: "test-model".to_string(),
            model_timeout_secs: 5,
            embedding_backend: EmbeddingBackend::Local,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: 512,
            chunk_overlap: 50,
            session_ttl_secs: 60,
            max_sessions: 100,
            context_ttl_secs: 60,
            max_contexts: 100,
            max_upload_bytes: 1024 * 1024,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
