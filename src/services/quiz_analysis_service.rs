use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnalysisResult, IncorrectAnswer, QuizQuestion},
    services::{
        context_service::{ContextService, ANALYSIS_TOP_K, BROAD_COVERAGE_QUERY},
        model_service::ModelClient,
        prompt_builder,
        response_parser,
    },
};

pub const NOT_ANSWERED: &str = "not answered";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnswerPartition {
    pub correct: Vec<String>,
    pub incorrect: Vec<IncorrectAnswer>,
}

/// Splits questions by exact match between the submitted answer and the key.
/// A question with no submission is incorrect.
pub fn partition_answers(
    questions: &[QuizQuestion],
    answers: &HashMap<usize, String>,
) -> AnswerPartition {
    let mut partition = AnswerPartition::default();

    for (index, question) in questions.iter().enumerate() {
        match answers.get(&index) {
            Some(answer) if question.is_correct(answer) => {
                partition.correct.push(question.question().to_string());
            }
            submitted => partition.incorrect.push(IncorrectAnswer {
                question: question.question().to_string(),
                user_answer: submitted
                    .cloned()
                    .unwrap_or_else(|| NOT_ANSWERED.to_string()),
                correct_answer: question.correct_answer().to_string(),
            }),
        }
    }

    partition
}

pub struct QuizAnalysisService {
    contexts: Arc<ContextService>,
    model: Arc<dyn ModelClient>,
}

impl QuizAnalysisService {
    pub fn new(contexts: Arc<ContextService>, model: Arc<dyn ModelClient>) -> Self {
        Self { contexts, model }
    }

    pub async fn analyze(
        &self,
        questions: &[QuizQuestion],
        answers: &HashMap<usize, String>,
        context: Option<&str>,
        context_id: Option<&str>,
    ) -> AppResult<AnalysisResult> {
        let partition = partition_answers(questions, answers);
        if partition.incorrect.is_empty() {
            log::info!("All {} answers correct, skipping model analysis", questions.len());
            return Ok(AnalysisResult::all_correct());
        }

        let grounding = match (context, context_id) {
            (Some(text), _) => text.to_string(),
            (None, Some(id)) => {
                self.contexts
                    .retrieve(id, BROAD_COVERAGE_QUERY, ANALYSIS_TOP_K)
                    .await?
            }
            (None, None) => {
                return Err(AppError::ValidationError("Context is required".to_string()))
            }
        };

        log::info!(
            "Analysing quiz: {} correct, {} incorrect",
            partition.correct.len(),
            partition.incorrect.len()
        );
        let prompt = prompt_builder::analysis(&grounding, &partition.correct, &partition.incorrect);
        let reply = self.model.complete(&prompt).await?;

        response_parser::parse_analysis(&reply).map_err(|e| {
            log::warn!("Rejected analysis reply: {}", e);
            AppError::from(e)
        })
    }
}
