use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPTION_COUNT: usize = 4;

pub const FALLBACK_QUESTION: &str =
    "Which approach best helps you remember the key ideas of this material?";
const FALLBACK_OPTIONS: [&str; OPTION_COUNT] = [
    "Skimming the headings once",
    "Explaining the main concepts in your own words",
    "Memorising every sentence word for word",
    "Skipping the examples",
];
const FALLBACK_ANSWER_INDEX: usize = 1;

/// A multiple-choice question with exactly four distinct options, one of which
/// is the correct answer. Construct through [`QuizQuestion::new`] so the
/// invariant holds for every instance, deserialized ones included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizQuestionPayload")]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizQuestionError {
    #[error("question text is empty")]
    EmptyQuestion,

    #[error("expected 4 options, got {0}")]
    WrongOptionCount(usize),

    #[error("options must be non-empty and distinct")]
    InvalidOptions,

    #[error("correct answer '{0}' is not one of the options")]
    AnswerNotInOptions(String),
}

/// Loose shape accepted from model replies and client payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestionPayload {
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer", alias = "answer")]
    pub correct_answer: String,
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuizQuestionError> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(QuizQuestionError::EmptyQuestion);
        }

        if options.len() != OPTION_COUNT {
            return Err(QuizQuestionError::WrongOptionCount(options.len()));
        }

        let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();
        let all_distinct = options
            .iter()
            .enumerate()
            .all(|(i, o)| !o.is_empty() && !options[..i].contains(o));
        if !all_distinct {
            return Err(QuizQuestionError::InvalidOptions);
        }

        let correct_answer = resolve_answer(correct_answer.into().trim(), &options)?;

        Ok(Self {
            question,
            options,
            correct_answer,
        })
    }

    /// Served in place of a single generated question whose reply could not be
    /// validated, so a session can always move forward.
    pub fn fallback() -> Self {
        Self {
            question: FALLBACK_QUESTION.to_string(),
            options: FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect(),
            correct_answer: FALLBACK_OPTIONS[FALLBACK_ANSWER_INDEX].to_string(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

impl TryFrom<QuizQuestionPayload> for QuizQuestion {
    type Error = QuizQuestionError;

    fn try_from(payload: QuizQuestionPayload) -> Result<Self, Self::Error> {
        QuizQuestion::new(payload.question, payload.options, payload.correct_answer)
    }
}

// Models sometimes answer with the option letter ("B") or "B) text" instead of the text.
fn resolve_answer(answer: &str, options: &[String]) -> Result<String, QuizQuestionError> {
    if let Some(option) = options.iter().find(|o| o.as_str() == answer) {
        return Ok(option.clone());
    }

    let mut chars = answer.chars();
    if let Some(letter) = chars.next() {
        let rest = chars.as_str().trim_start_matches([')', '.', ':']).trim();
        let index = match letter.to_ascii_uppercase() {
            'A' => Some(0),
            'B' => Some(1),
            'C' => Some(2),
            'D' => Some(3),
            _ => None,
        };
        if let Some(index) = index {
            let is_bare_letter = rest.is_empty() && answer.len() == 1;
            let is_labelled = !rest.is_empty() && rest == options[index];
            if is_bare_letter || is_labelled {
                return Ok(options[index].clone());
            }
        }
    }

    Err(QuizQuestionError::AnswerNotInOptions(answer.to_string()))
}
