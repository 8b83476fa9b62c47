use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Where a session's questions are drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceContext {
    Raw(String),
    Indexed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Complete,
}

/// Incremental quiz state. `cursor <= questions.len() <= target_count` holds
/// after every mutation; questions are append-only and the cursor only moves
/// forward.
#[derive(Clone, Debug)]
pub struct QuizSession {
    id: String,
    source: SourceContext,
    questions: Vec<QuizQuestion>,
    cursor: usize,
    target_count: usize,
    created_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(source: SourceContext, target_count: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
            questions: Vec::new(),
            cursor: 0,
            target_count,
            created_at: Utc::now(),
        }
    }

    /// A session whose questions were generated in one go. The cursor starts at
    /// zero so the quiz can still be walked one question at a time.
    pub fn prepopulated(source: SourceContext, questions: Vec<QuizQuestion>) -> Self {
        let target_count = questions.len();
        Self {
            questions,
            ..Self::new(source, target_count)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &SourceContext {
        &self.source
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        if self.cursor >= self.target_count {
            SessionState::Complete
        } else {
            SessionState::Active
        }
    }

    /// True when the next request has to generate a question before serving.
    pub fn needs_question(&self) -> bool {
        self.cursor == self.questions.len() && self.questions.len() < self.target_count
    }

    pub fn prior_question_texts(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.question().to_string())
            .collect()
    }

    /// Returns false and leaves the session untouched when the target is already met.
    pub fn push_question(&mut self, question: QuizQuestion) -> bool {
        if self.questions.len() >= self.target_count {
            return false;
        }
        self.questions.push(question);
        true
    }

    /// Serves the question under the cursor and advances it. The returned
    /// number is 1-based.
    pub fn serve_next(&mut self) -> Option<(QuizQuestion, usize)> {
        let question = self.questions.get(self.cursor)?.clone();
        self.cursor += 1;
        Some((question, self.cursor))
    }
}
