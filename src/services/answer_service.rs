use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    services::{
        context_service::{ContextService, ASK_TOP_K, BROAD_COVERAGE_QUERY, SUMMARY_TOP_K},
        model_service::ModelClient,
        prompt_builder::{self, LearnerLevel},
    },
};

/// Question answering and summarisation over stored or inline material.
pub struct AnswerService {
    contexts: Arc<ContextService>,
    model: Arc<dyn ModelClient>,
}

impl AnswerService {
    pub fn new(contexts: Arc<ContextService>, model: Arc<dyn ModelClient>) -> Self {
        Self { contexts, model }
    }

    /// Grounded when the context exists; an unknown context falls back to an
    /// ungrounded answer instead of failing.
    pub async fn ask(
        &self,
        query: &str,
        level: LearnerLevel,
        context_id: Option<&str>,
    ) -> AppResult<String> {
        let prompt = match context_id {
            Some(id) => match self.contexts.retrieve(id, query, ASK_TOP_K).await {
                Ok(grounding) => prompt_builder::grounded_answer(query, &grounding, level),
                Err(AppError::NotFound(_)) => {
                    log::warn!("Context {} not found, answering without it", id);
                    prompt_builder::general_answer(query, level)
                }
                Err(e) => return Err(e),
            },
            None => prompt_builder::general_answer(query, level),
        };

        let answer = self.model.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    pub async fn summarize(
        &self,
        context: Option<&str>,
        context_id: Option<&str>,
        level: LearnerLevel,
    ) -> AppResult<String> {
        let material = match (context, context_id) {
            (Some(text), _) => text.to_string(),
            (None, Some(id)) => {
                self.contexts
                    .retrieve(id, BROAD_COVERAGE_QUERY, SUMMARY_TOP_K)
                    .await?
            }
            (None, None) => {
                return Err(AppError::ValidationError("Context is required".to_string()))
            }
        };

        let summary = self
            .model
            .complete(&prompt_builder::summary(&material, level))
            .await?;
        Ok(summary.trim().to_string())
    }
}
