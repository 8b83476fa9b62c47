#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::QuizQuestion;

    /// A valid question whose text and options are derived from `n`, so equal
    /// `n` always yields equal questions.
    pub fn question(n: usize) -> QuizQuestion {
        QuizQuestion::new(
            format!("Question {}?", n),
            (1..=4).map(|o| format!("Option {}.{}", n, o)).collect(),
            format!("Option {}.1", n),
        )
        .expect("fixture question is valid")
    }

    /// The model reply that parses into `question(n)`.
    pub fn question_json(n: usize) -> String {
        serde_json::json!({
            "question": format!("Question {}?", n),
            "options": (1..=4).map(|o| format!("Option {}.{}", n, o)).collect::<Vec<_>>(),
            "correct_answer": format!("Option {}.1", n),
        })
        .to_string()
    }

    pub fn quiz_json(count: usize) -> String {
        let items: Vec<String> = (1..=count).map(question_json).collect();
        format!("[{}]", items.join(","))
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::response_parser::{parse_quiz, parse_quiz_question};

    #[test]
    fn fixture_questions_are_deterministic() {
        assert_eq!(question(3), question(3));
        assert_ne!(question(3), question(4));
    }

    #[test]
    fn fixture_json_parses_back_to_fixture() {
        assert_eq!(parse_quiz_question(&question_json(2)).unwrap(), question(2));
        assert_eq!(parse_quiz(&quiz_json(3), 3).unwrap()[2], question(3));
    }
}
