//! Tolerant extraction of structured data from free-form model replies.
//!
//! Every target goes through the same tiers: fence stripping, a strict parse,
//! a string-aware balanced scan from the first opening delimiter, and finally a
//! greedy match from the first opening to the last closing delimiter.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::domain::quiz_question::QuizQuestionPayload;
use crate::models::domain::{AnalysisResult, QuizQuestion, QuizQuestionError};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*").unwrap());
static GREEDY_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static GREEDY_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn open(self) -> char {
        match self {
            JsonShape::Object => '{',
            JsonShape::Array => '[',
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonShape::Object => value.is_object(),
            JsonShape::Array => value.is_array(),
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonShape::Object => write!(f, "object"),
            JsonShape::Array => write!(f, "array"),
        }
    }
}

/// A reply that could not be turned into the requested structure. Distinct
/// from transport failures: the model answered, but not usably.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no JSON {0} found in reply")]
    NoJson(JsonShape),

    #[error("reply is missing required fields: {0}")]
    MissingFields(String),

    #[error(transparent)]
    InvalidQuestion(#[from] QuizQuestionError),

    #[error("expected {expected} questions, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("question repeats an earlier one: {0}")]
    DuplicateQuestion(String),
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::InvalidModelOutput(err.to_string())
    }
}

pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

fn parse_strict(text: &str, shape: JsonShape) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(|value| shape.matches(value))
}

/// Returns the span from the first opening delimiter to its matching closer,
/// ignoring delimiters inside string literals.
fn balanced_span(text: &str, shape: JsonShape) -> Option<&str> {
    let start = text.find(shape.open())?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn greedy_span(text: &str, shape: JsonShape) -> Option<&str> {
    let pattern = match shape {
        JsonShape::Object => &GREEDY_OBJECT,
        JsonShape::Array => &GREEDY_ARRAY,
    };
    pattern.find(text).map(|m| m.as_str())
}

pub fn extract_json(raw: &str, shape: JsonShape) -> Result<Value, ParseError> {
    let cleaned = strip_code_fences(raw);

    parse_strict(&cleaned, shape)
        .or_else(|| balanced_span(&cleaned, shape).and_then(|span| parse_strict(span, shape)))
        .or_else(|| greedy_span(&cleaned, shape).and_then(|span| parse_strict(span, shape)))
        .ok_or(ParseError::NoJson(shape))
}

fn question_from_value(value: Value) -> Result<QuizQuestion, ParseError> {
    let payload: QuizQuestionPayload =
        serde_json::from_value(value).map_err(|e| ParseError::MissingFields(e.to_string()))?;
    Ok(QuizQuestion::try_from(payload)?)
}

pub fn parse_quiz_question(raw: &str) -> Result<QuizQuestion, ParseError> {
    question_from_value(extract_json(raw, JsonShape::Object)?)
}

/// Parses a full quiz. Anything other than exactly `expected` valid questions
/// is rejected as a whole.
pub fn parse_quiz(raw: &str, expected: usize) -> Result<Vec<QuizQuestion>, ParseError> {
    let items = match extract_json(raw, JsonShape::Array)? {
        Value::Array(items) => items,
        _ => return Err(ParseError::NoJson(JsonShape::Array)),
    };

    if items.len() != expected {
        return Err(ParseError::CountMismatch {
            expected,
            actual: items.len(),
        });
    }

    items.into_iter().map(question_from_value).collect()
}

pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ParseError> {
    let value = extract_json(raw, JsonShape::Object)?;
    serde_json::from_value(value).map_err(|e| ParseError::MissingFields(e.to_string()))
}
