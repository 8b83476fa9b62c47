use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, alias = "strongAreas")]
    pub strong_areas: Vec<String>,
    #[serde(default, alias = "weakAreas")]
    pub weak_areas: Vec<String>,
    pub feedback: String,
}

impl AnalysisResult {
    /// Returned without a model call when every answer was right.
    pub fn all_correct() -> Self {
        Self {
            strong_areas: vec!["All topics covered in this quiz".to_string()],
            weak_areas: Vec::new(),
            feedback: "Excellent work! You answered every question correctly and show a solid grasp of this material.".to_string(),
        }
    }
}

/// One wrong or missing answer, as listed in the analysis prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncorrectAnswer {
    pub question: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}
