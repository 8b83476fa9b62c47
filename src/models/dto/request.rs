use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::models::domain::QuizQuestion;

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()).unwrap_or_default())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AskRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Query is required"))]
    pub query: String,

    #[serde(default)]
    pub user_level: Option<String>,

    #[serde(default)]
    pub context_id: Option<String>,
}

impl AskRequest {
    pub fn context_id(&self) -> Option<&str> {
        non_blank(&self.context_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub context_id: Option<String>,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub user_level: Option<String>,
}

impl SummarizeRequest {
    pub fn context_id(&self) -> Option<&str> {
        non_blank(&self.context_id)
    }

    pub fn context(&self) -> Option<&str> {
        non_blank(&self.context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Full,
    Incremental,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[serde(default)]
    pub context_id: Option<String>,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = 20, message = "num_questions must be between 1 and 20"))]
    pub num_questions: Option<usize>,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub mode: Option<QuizMode>,
}

impl GenerateQuizRequest {
    pub fn context_id(&self) -> Option<&str> {
        non_blank(&self.context_id)
    }

    pub fn context(&self) -> Option<&str> {
        non_blank(&self.context)
    }

    pub fn session_id(&self) -> Option<&str> {
        non_blank(&self.session_id)
    }

    /// Explicit mode wins; otherwise a session id means the client is walking
    /// a quiz one question at a time.
    pub fn resolved_mode(&self) -> QuizMode {
        match (self.mode, self.session_id()) {
            (Some(mode), _) => mode,
            (None, Some(_)) => QuizMode::Incremental,
            (None, None) => QuizMode::Full,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnalyzeQuizRequest {
    #[serde(default)]
    pub context_id: Option<String>,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Quiz questions are required"))]
    pub quiz_questions: Vec<QuizQuestion>,

    #[serde(default)]
    pub user_answers: HashMap<String, String>,
}

impl AnalyzeQuizRequest {
    pub fn context_id(&self) -> Option<&str> {
        non_blank(&self.context_id)
    }

    pub fn context(&self) -> Option<&str> {
        non_blank(&self.context)
    }

    /// Submitted answers keyed by question index; keys that are not indices are dropped.
    pub fn answers_by_index(&self) -> HashMap<usize, String> {
        self.user_answers
            .iter()
            .filter_map(|(key, answer)| Some((key.trim().parse().ok()?, answer.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProcessContextRequest {
    #[serde(rename = "youtubeUrl", alias = "youtube_url", default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "A file upload or youtubeUrl is required"))]
    pub youtube_url: String,
}
