//! Prompt construction. Every function here is pure: same inputs, same prompt.

use std::fmt;

use crate::constants::prompts::{
    ADVANCED_GUIDANCE, ANALYSIS_PROMPT, AVOID_REPEAT_BLOCK, BEGINNER_GUIDANCE, FULL_QUIZ_PROMPT,
    GENERAL_ANSWER_PROMPT, GROUNDED_ANSWER_PROMPT, INTERMEDIATE_GUIDANCE, NOT_IN_CONTEXT_ANSWER,
    QUESTION_SCHEMA, SINGLE_QUESTION_PROMPT, SUMMARY_PROMPT,
};
use crate::models::domain::IncorrectAnswer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LearnerLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl LearnerLevel {
    /// Unrecognised or missing levels fall back to beginner.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("intermediate") => LearnerLevel::Intermediate,
            Some("advanced") => LearnerLevel::Advanced,
            _ => LearnerLevel::Beginner,
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            LearnerLevel::Beginner => BEGINNER_GUIDANCE,
            LearnerLevel::Intermediate => INTERMEDIATE_GUIDANCE,
            LearnerLevel::Advanced => ADVANCED_GUIDANCE,
        }
    }
}

impl fmt::Display for LearnerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnerLevel::Beginner => write!(f, "beginner"),
            LearnerLevel::Intermediate => write!(f, "intermediate"),
            LearnerLevel::Advanced => write!(f, "advanced"),
        }
    }
}

pub fn general_answer(query: &str, level: LearnerLevel) -> String {
    fill(
        GENERAL_ANSWER_PROMPT,
        &[
            ("level_guidance", level.guidance()),
            ("level", level.to_string().as_str()),
            ("query", query),
        ],
    )
}

pub fn grounded_answer(query: &str, context: &str, level: LearnerLevel) -> String {
    fill(
        GROUNDED_ANSWER_PROMPT,
        &[
            ("refusal", NOT_IN_CONTEXT_ANSWER),
            ("level", level.to_string().as_str()),
            ("context", context),
            ("query", query),
        ],
    )
}

pub fn summary(context: &str, level: LearnerLevel) -> String {
    fill(
        SUMMARY_PROMPT,
        &[
            ("level_guidance", level.guidance()),
            ("level", level.to_string().as_str()),
            ("context", context),
        ],
    )
}

pub fn single_question(context: &str, prior_questions: &[String]) -> String {
    let avoid_block = if prior_questions.is_empty() {
        String::new()
    } else {
        let listed: Vec<String> = prior_questions.iter().map(|q| format!("- {}", q)).collect();
        fill(AVOID_REPEAT_BLOCK, &[("questions", listed.join("\n").as_str())])
    };

    fill(
        SINGLE_QUESTION_PROMPT,
        &[
            ("schema", QUESTION_SCHEMA),
            ("avoid_block", avoid_block.as_str()),
            ("context", context),
        ],
    )
}

pub fn full_quiz(context: &str, count: usize) -> String {
    fill(
        FULL_QUIZ_PROMPT,
        &[
            ("schema", QUESTION_SCHEMA),
            ("count", count.to_string().as_str()),
            ("context", context),
        ],
    )
}

pub fn analysis(context: &str, correct: &[String], incorrect: &[IncorrectAnswer]) -> String {
    let correct_block = if correct.is_empty() {
        "(none)".to_string()
    } else {
        correct
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let incorrect_block =
        serde_json::to_string_pretty(incorrect).unwrap_or_else(|_| "[]".to_string());

    fill(
        ANALYSIS_PROMPT,
        &[
            ("correct", correct_block.as_str()),
            ("incorrect", incorrect_block.as_str()),
            ("context", context),
        ],
    )
}

/// Replaces `{name}` placeholders in one left-to-right pass. Inserted values
/// are never rescanned, and braces that do not name a placeholder are kept.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            values
                .iter()
                .find(|(name, _)| *name == &tail[1..close])
                .map(|(_, value)| (close, *value))
        });

        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
