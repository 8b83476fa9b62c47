use std::time::Duration;

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::{config::Config, errors::AppError};

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("model call timed out after {0}s")]
    Timeout(u64),

    #[error("model returned an empty completion")]
    EmptyCompletion,
}

impl From<OpenAIError> for ModelError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => ModelError::Service(api.message),
            other => ModelError::Transport(other.to_string()),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::ModelUnavailable(err.to_string())
    }
}

/// Single-shot text completion against the generative model. Each call is
/// attempted exactly once.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint (Gemini's by default).
pub struct OpenAiModelClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiModelClient {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.model_api_key.expose_secret())
            .with_api_base(&config.model_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.model_name.clone(),
            timeout: Duration::from_secs(config.model_timeout_secs),
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        log::debug!(
            "Sending prompt to model {} ({} chars)",
            self.model,
            prompt.len()
        );

        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let chat = self.client.chat();
        let call = chat.create_byot(request);
        let reply: ChatCompletionReply = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ModelError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                log::error!("Model call failed: {}", e);
                ModelError::from(e)
            })?;

        let text = first_choice_text(reply)?;
        log::debug!("Model reply received ({} chars)", text.len());
        Ok(text)
    }
}

fn first_choice_text(reply: ChatCompletionReply) -> Result<String, ModelError> {
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ModelError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_choices_are_an_empty_completion() {
        let reply: ChatCompletionReply = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_choice_text(reply),
            Err(ModelError::EmptyCompletion)
        ));

        let reply: ChatCompletionReply =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert!(matches!(
            first_choice_text(reply),
            Err(ModelError::EmptyCompletion)
        ));
    }

    #[test]
    fn first_choice_text_is_returned() {
        let reply: ChatCompletionReply = serde_json::from_str(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(reply).unwrap(), "Hello");
    }

    #[test]
    fn model_errors_map_to_model_unavailable() {
        let err: AppError = ModelError::Timeout(5).into();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert_eq!(err.error_code(), "MODEL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn mock_client_returns_canned_reply() {
        let mut mock = MockModelClient::new();
        mock.expect_complete()
            .withf(|prompt| prompt.contains("photosynthesis"))
            .times(1)
            .returning(|_| Ok("Plants make sugar from light.".to_string()));

        let reply = mock.complete("Explain photosynthesis").await.unwrap();
        assert_eq!(reply, "Plants make sugar from light.");
    }
}
