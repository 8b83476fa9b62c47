use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{AnalysisResult, QuizQuestion, QuizSession, SessionState};
use crate::services::quiz_session_service::QuizStep;

pub const QUIZ_COMPLETED_MESSAGE: &str = "Quiz completed! You've answered all questions.";

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessContextResponse {
    pub context_id: String,
    pub message: String,
    pub chunk_count: usize,
}

#[derive(Debug, Serialize)]
pub struct FullQuizResponse {
    pub quiz: Vec<QuizQuestion>,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct QuizQuestionResponse {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub session_id: String,
    pub question_number: usize,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct QuizCompletedResponse {
    pub completed: bool,
    pub message: String,
    pub session_id: String,
    pub question_number: usize,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuizStepResponse {
    Question(QuizQuestionResponse),
    Completed(QuizCompletedResponse),
}

impl From<QuizStep> for QuizStepResponse {
    fn from(step: QuizStep) -> Self {
        match step {
            QuizStep::Question {
                session_id,
                question,
                question_number,
                total_questions,
            } => QuizStepResponse::Question(QuizQuestionResponse {
                question: question.question().to_string(),
                options: question.options().to_vec(),
                correct_answer: question.correct_answer().to_string(),
                session_id,
                question_number,
                total_questions,
            }),
            QuizStep::Completed {
                session_id,
                question_number,
                total_questions,
            } => QuizStepResponse::Completed(QuizCompletedResponse {
                completed: true,
                message: QUIZ_COMPLETED_MESSAGE.to_string(),
                session_id,
                question_number,
                total_questions,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub question_number: usize,
    pub total_questions: usize,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&QuizSession> for SessionStatusResponse {
    fn from(session: &QuizSession) -> Self {
        SessionStatusResponse {
            session_id: session.id().to_string(),
            question_number: session.cursor(),
            total_questions: session.target_count(),
            completed: session.state() == SessionState::Complete,
            created_at: session.created_at(),
        }
    }
}
