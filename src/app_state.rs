use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::{InMemoryContextRepository, InMemorySessionRepository},
    services::{
        answer_service::AnswerService,
        chunker::TextChunker,
        context_service::ContextService,
        embedding_service::{build_embedding_provider, EmbeddingProvider},
        model_service::{ModelClient, OpenAiModelClient},
        quiz_analysis_service::QuizAnalysisService,
        quiz_session_service::QuizSessionService,
        transcript_service::{TranscriptFetcher, YouTubeTranscriptFetcher},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub context_service: Arc<ContextService>,
    pub answer_service: Arc<AnswerService>,
    pub quiz_session_service: Arc<QuizSessionService>,
    pub quiz_analysis_service: Arc<QuizAnalysisService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let model: Arc<dyn ModelClient> = Arc::new(OpenAiModelClient::new(&config));
        let embedder = build_embedding_provider(&config);
        let transcripts: Arc<dyn TranscriptFetcher> =
            Arc::new(YouTubeTranscriptFetcher::new(config.model_timeout_secs)?);

        log::info!(
            "Using model {} at {} with {:?} embeddings",
            config.model_name,
            config.model_api_base,
            config.embedding_backend
        );
        Ok(Self::from_parts(config, model, embedder, transcripts))
    }

    /// Wires the services around externally supplied clients.
    pub fn from_parts(
        config: Config,
        model: Arc<dyn ModelClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        transcripts: Arc<dyn TranscriptFetcher>,
    ) -> Self {
        let context_repository = Arc::new(InMemoryContextRepository::new(
            config.max_contexts,
            Duration::from_secs(config.context_ttl_secs),
        ));
        let session_repository = Arc::new(InMemorySessionRepository::new(
            config.max_sessions,
            Duration::from_secs(config.session_ttl_secs),
        ));

        let context_service = Arc::new(ContextService::new(
            context_repository,
            embedder,
            transcripts,
            TextChunker::new(config.chunk_size, config.chunk_overlap),
        ));
        let answer_service = Arc::new(AnswerService::new(context_service.clone(), model.clone()));
        let quiz_session_service = Arc::new(QuizSessionService::new(
            session_repository,
            context_service.clone(),
            model.clone(),
        ));
        let quiz_analysis_service =
            Arc::new(QuizAnalysisService::new(context_service.clone(), model));

        Self {
            context_service,
            answer_service,
            quiz_session_service,
            quiz_analysis_service,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[actix_rt::test]
    async fn builds_from_test_config() {
        let state = AppState::new(Config::test_config()).unwrap();
        assert_eq!(state.config.chunk_size, 512);
        assert_eq!(state.context_service.count().await, 0);
        assert_eq!(state.quiz_session_service.count().await, 0);
    }
}
