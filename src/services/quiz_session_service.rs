use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{QuizQuestion, QuizSession, SessionState, SourceContext},
    repositories::{session_repository::SharedSession, SessionRepository},
    services::{
        context_service::{ContextService, BROAD_COVERAGE_QUERY, QUIZ_TOP_K},
        model_service::ModelClient,
        prompt_builder,
        response_parser::{self, ParseError},
    },
};

/// Outcome of one incremental quiz request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    Question {
        session_id: String,
        question: QuizQuestion,
        question_number: usize,
        total_questions: usize,
    },
    Completed {
        session_id: String,
        question_number: usize,
        total_questions: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuiz {
    pub session_id: String,
    pub questions: Vec<QuizQuestion>,
}

pub struct QuizSessionService {
    sessions: Arc<dyn SessionRepository>,
    contexts: Arc<ContextService>,
    model: Arc<dyn ModelClient>,
}

impl QuizSessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        contexts: Arc<ContextService>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            sessions,
            contexts,
            model,
        }
    }

    /// Serves the next question of a session, creating the session when the id
    /// is absent or unknown. Context fields are only read at creation, and a new
    /// session is stored only once its first question has been served.
    pub async fn next_question(
        &self,
        session_id: Option<&str>,
        context: Option<&str>,
        context_id: Option<&str>,
        target_count: usize,
    ) -> AppResult<QuizStep> {
        let Some(shared) = self.find_session(session_id).await? else {
            return self.start_session(context, context_id, target_count).await;
        };

        let mut session = shared.lock().await;
        self.advance(&mut session).await
    }

    async fn start_session(
        &self,
        context: Option<&str>,
        context_id: Option<&str>,
        target_count: usize,
    ) -> AppResult<QuizStep> {
        let source = self.resolve_source(context, context_id).await?;
        let mut session = QuizSession::new(source, target_count);

        let step = self.advance(&mut session).await?;
        log::info!(
            "Created quiz session {} with {} questions",
            session.id(),
            target_count
        );
        self.sessions.insert(session).await?;
        Ok(step)
    }

    async fn advance(&self, session: &mut QuizSession) -> AppResult<QuizStep> {
        if session.state() == SessionState::Complete {
            return Ok(QuizStep::Completed {
                session_id: session.id().to_string(),
                question_number: session.cursor(),
                total_questions: session.target_count(),
            });
        }

        if session.needs_question() {
            let question = self.generate_question(session).await?;
            session.push_question(question);
        }

        let total_questions = session.target_count();
        let session_id = session.id().to_string();
        let (question, question_number) = session.serve_next().ok_or_else(|| {
            AppError::InternalError(format!("session {} has no question to serve", session_id))
        })?;

        log::info!(
            "Serving question {} of {} for session {}",
            question_number,
            total_questions,
            session_id
        );
        Ok(QuizStep::Question {
            session_id,
            question,
            question_number,
            total_questions,
        })
    }

    /// Generates a whole quiz in one model call and stores it as a session the
    /// client can still walk one question at a time.
    pub async fn generate_full_quiz(
        &self,
        context: Option<&str>,
        context_id: Option<&str>,
        count: usize,
    ) -> AppResult<GeneratedQuiz> {
        let source = self.resolve_source(context, context_id).await?;
        let grounding = self.grounding(&source).await?;

        let reply = self
            .model
            .complete(&prompt_builder::full_quiz(&grounding, count))
            .await?;
        let questions = response_parser::parse_quiz(&reply, count).map_err(|e| {
            log::warn!("Rejected full quiz reply: {}", e);
            AppError::from(e)
        })?;

        let session = QuizSession::prepopulated(source, questions.clone());
        let session_id = session.id().to_string();
        self.sessions.insert(session).await?;

        log::info!(
            "Generated full quiz of {} questions as session {}",
            count,
            session_id
        );
        Ok(GeneratedQuiz {
            session_id,
            questions,
        })
    }

    pub async fn session_status(&self, session_id: &str) -> AppResult<QuizSession> {
        let shared = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz session not found: {}", session_id)))?;
        let session = shared.lock().await;
        Ok(session.clone())
    }

    pub async fn count(&self) -> u64 {
        self.sessions.count().await
    }

    async fn find_session(&self, session_id: Option<&str>) -> AppResult<Option<SharedSession>> {
        let Some(id) = session_id else {
            return Ok(None);
        };

        let found = self.sessions.find_by_id(id).await?;
        if found.is_none() {
            log::info!("Unknown quiz session {}, starting a new one", id);
        }
        Ok(found)
    }

    /// Raw text wins over a context id. An id must name a stored context.
    async fn resolve_source(
        &self,
        context: Option<&str>,
        context_id: Option<&str>,
    ) -> AppResult<SourceContext> {
        if let Some(text) = context {
            return Ok(SourceContext::Raw(text.to_string()));
        }

        match context_id {
            Some(id) if self.contexts.contains(id).await? => {
                Ok(SourceContext::Indexed(id.to_string()))
            }
            Some(id) => Err(AppError::NotFound(format!("Context not found: {}", id))),
            None => Err(AppError::ValidationError("Context is required".to_string())),
        }
    }

    async fn grounding(&self, source: &SourceContext) -> AppResult<String> {
        match source {
            SourceContext::Raw(text) => Ok(text.clone()),
            SourceContext::Indexed(id) => {
                self.contexts
                    .retrieve(id, BROAD_COVERAGE_QUERY, QUIZ_TOP_K)
                    .await
            }
        }
    }

    /// Model failures propagate. A reply that cannot be validated is replaced
    /// by the fallback question so the session keeps moving.
    async fn generate_question(&self, session: &QuizSession) -> AppResult<QuizQuestion> {
        let grounding = self.grounding(session.source()).await?;
        let prior = session.prior_question_texts();

        let reply = self
            .model
            .complete(&prompt_builder::single_question(&grounding, &prior))
            .await?;

        let parsed = response_parser::parse_quiz_question(&reply)
            .and_then(|question| reject_repeat(question, &prior));
        match parsed {
            Ok(question) => Ok(question),
            Err(e) => {
                log::warn!(
                    "Substituting fallback question in session {}: {}",
                    session.id(),
                    e
                );
                Ok(QuizQuestion::fallback())
            }
        }
    }
}

fn reject_repeat(question: QuizQuestion, prior: &[String]) -> Result<QuizQuestion, ParseError> {
    let text = question.question().trim().to_lowercase();
    if prior.iter().any(|p| p.trim().to_lowercase() == text) {
        return Err(ParseError::DuplicateQuestion(question.question().to_string()));
    }
    Ok(question)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::models::domain::quiz_session::DEFAULT_QUESTION_COUNT;
    use crate::repositories::{InMemoryContextRepository, InMemorySessionRepository};
    use crate::services::chunker::TextChunker;
    use crate::services::embedding_service::HashingEmbedder;
    use crate::services::model_service::{MockModelClient, ModelError};
    use crate::services::transcript_service::MockTranscriptFetcher;
    use crate::test_utils::fixtures::{question, question_json, quiz_json};

    const CONTEXT: &str = "Photosynthesis converts light into chemical energy.";

    fn context_service() -> Arc<ContextService> {
        Arc::new(ContextService::new(
            Arc::new(InMemoryContextRepository::new(10, Duration::from_secs(60))),
            Arc::new(HashingEmbedder::default()),
            Arc::new(MockTranscriptFetcher::new()),
            TextChunker::new(512, 50),
        ))
    }

    fn service(model: MockModelClient) -> QuizSessionService {
        QuizSessionService::new(
            Arc::new(InMemorySessionRepository::new(10, Duration::from_secs(60))),
            context_service(),
            Arc::new(model),
        )
    }

    /// Replies with question 1, 2, 3... on successive calls.
    fn numbered_model(expected_calls: usize) -> MockModelClient {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .times(expected_calls)
            .returning(move |_| Ok(question_json(counter.fetch_add(1, Ordering::SeqCst) + 1)));
        model
    }

    fn session_id_of(step: &QuizStep) -> String {
        match step {
            QuizStep::Question { session_id, .. } | QuizStep::Completed { session_id, .. } => {
                session_id.clone()
            }
        }
    }

    #[actix_rt::test]
    async fn walks_a_session_to_completion() {
        let service = service(numbered_model(2));

        let first = service
            .next_question(None, Some(CONTEXT), None, 2)
            .await
            .unwrap();
        let id = session_id_of(&first);
        assert_eq!(
            first,
            QuizStep::Question {
                session_id: id.clone(),
                question: question(1),
                question_number: 1,
                total_questions: 2,
            }
        );

        let second = service
            .next_question(Some(&id), None, None, 2)
            .await
            .unwrap();
        assert!(matches!(
            second,
            QuizStep::Question { question_number: 2, .. }
        ));

        for _ in 0..2 {
            let done = service
                .next_question(Some(&id), None, None, 2)
                .await
                .unwrap();
            assert_eq!(
                done,
                QuizStep::Completed {
                    session_id: id.clone(),
                    question_number: 2,
                    total_questions: 2,
                }
            );
        }
    }

    #[actix_rt::test]
    async fn target_count_is_fixed_at_creation() {
        let service = service(numbered_model(2));
        let first = service
            .next_question(None, Some(CONTEXT), None, DEFAULT_QUESTION_COUNT)
            .await
            .unwrap();
        let id = session_id_of(&first);

        let second = service
            .next_question(Some(&id), Some("other text"), None, 2)
            .await
            .unwrap();
        assert!(matches!(
            second,
            QuizStep::Question { question_number: 2, total_questions: DEFAULT_QUESTION_COUNT, .. }
        ));

        let status = service.session_status(&id).await.unwrap();
        assert_eq!(status.target_count(), DEFAULT_QUESTION_COUNT);
        assert_eq!(status.source(), &SourceContext::Raw(CONTEXT.to_string()));
    }

    #[actix_rt::test]
    async fn invalid_reply_is_replaced_by_fallback() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_| Ok("I cannot produce JSON today.".to_string()));
        let service = service(model);

        let step = service
            .next_question(None, Some(CONTEXT), None, 3)
            .await
            .unwrap();
        match step {
            QuizStep::Question { question, question_number, .. } => {
                assert_eq!(question, QuizQuestion::fallback());
                assert_eq!(question_number, 1);
            }
            other => panic!("expected a question, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn repeated_question_is_replaced_by_fallback() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .times(2)
            .returning(|_| Ok(question_json(1).replace("Question 1?", "QUESTION 1?")));
        let service = service(model);

        let first = service
            .next_question(None, Some(CONTEXT), None, 3)
            .await
            .unwrap();
        let id = session_id_of(&first);
        let second = service
            .next_question(Some(&id), None, None, 3)
            .await
            .unwrap();

        assert!(matches!(
            second,
            QuizStep::Question { ref question, .. } if *question == QuizQuestion::fallback()
        ));
    }

    #[actix_rt::test]
    async fn prior_questions_are_sent_to_the_model() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .withf(|prompt| !prompt.contains("previously asked"))
            .times(1)
            .returning(|_| Ok(question_json(1)));
        model
            .expect_complete()
            .withf(|prompt| prompt.contains("- Question 1?"))
            .times(1)
            .returning(|_| Ok(question_json(2)));
        let service = service(model);

        let first = service
            .next_question(None, Some(CONTEXT), None, 2)
            .await
            .unwrap();
        let id = session_id_of(&first);
        service
            .next_question(Some(&id), None, None, 2)
            .await
            .unwrap();
    }

    #[actix_rt::test]
    async fn model_failure_does_not_advance_the_cursor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut model = MockModelClient::new();
        model.expect_complete().times(3).returning(move |_| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                1 => Err(ModelError::Transport("connection reset".to_string())),
                n => Ok(question_json(n + 1)),
            }
        });
        let service = service(model);

        let first = service
            .next_question(None, Some(CONTEXT), None, 3)
            .await
            .unwrap();
        let id = session_id_of(&first);

        let err = service
            .next_question(Some(&id), None, None, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));

        let status = service.session_status(&id).await.unwrap();
        assert_eq!(status.cursor(), 1);
        assert_eq!(status.questions().len(), 1);
        assert_eq!(status.state(), SessionState::Active);

        let retried = service
            .next_question(Some(&id), None, None, 3)
            .await
            .unwrap();
        assert!(matches!(
            retried,
            QuizStep::Question { question_number: 2, .. }
        ));
    }

    #[actix_rt::test]
    async fn failed_first_question_leaves_no_session_behind() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .times(2)
            .returning(|_| Err(ModelError::Timeout(5)));
        let service = service(model);

        for _ in 0..2 {
            let err = service
                .next_question(None, Some(CONTEXT), None, 3)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ModelUnavailable(_)));
        }
        assert_eq!(service.count().await, 0);
    }

    /// Answers after a short async delay so concurrent callers overlap.
    #[derive(Default)]
    struct SlowModel {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ModelClient for SlowModel {
        async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(question_json(n))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_on_one_session_are_serialized() {
        let model = Arc::new(SlowModel::default());
        let service = Arc::new(QuizSessionService::new(
            Arc::new(InMemorySessionRepository::new(10, Duration::from_secs(60))),
            context_service(),
            model.clone(),
        ));

        let first = service
            .next_question(None, Some(CONTEXT), None, 3)
            .await
            .unwrap();
        let id = session_id_of(&first);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let service = service.clone();
                let id = id.clone();
                tokio::spawn(async move { service.next_question(Some(&id), None, None, 3).await })
            })
            .collect();

        let mut served = Vec::new();
        let mut completed = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                QuizStep::Question { question_number, .. } => served.push(question_number),
                QuizStep::Completed { .. } => completed += 1,
            }
        }
        served.sort_unstable();

        assert_eq!(served, vec![2, 3]);
        assert_eq!(completed, 4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);

        let status = service.session_status(&id).await.unwrap();
        assert_eq!(status.questions().len(), 3);
        assert_eq!(status.cursor(), 3);
    }

    #[actix_rt::test]
    async fn unknown_session_id_starts_a_new_session() {
        let service = service(numbered_model(1));

        let step = service
            .next_question(Some("stale-id"), Some(CONTEXT), None, 2)
            .await
            .unwrap();
        let id = session_id_of(&step);
        assert_ne!(id, "stale-id");
        assert!(service.session_status(&id).await.is_ok());
    }

    #[actix_rt::test]
    async fn new_session_requires_a_context() {
        let mut model = MockModelClient::new();
        model.expect_complete().times(0);
        let service = service(model);

        let err = service.next_question(None, None, None, 2).await.unwrap_err();
        assert_eq!(err.to_string(), "Context is required");

        let err = service
            .next_question(None, None, Some("missing"), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(service.count().await, 0);
    }

    #[actix_rt::test]
    async fn full_quiz_returns_exact_count_and_is_walkable() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .withf(|prompt| prompt.contains("exactly 2 multiple-choice questions"))
            .times(1)
            .returning(|_| Ok(format!("```json\n{}\n```", quiz_json(2))));
        let service = service(model);

        let quiz = service
            .generate_full_quiz(Some(CONTEXT), None, 2)
            .await
            .unwrap();
        assert_eq!(quiz.questions, vec![question(1), question(2)]);

        let step = service
            .next_question(Some(&quiz.session_id), None, None, 5)
            .await
            .unwrap();
        assert_eq!(
            step,
            QuizStep::Question {
                session_id: quiz.session_id.clone(),
                question: question(1),
                question_number: 1,
                total_questions: 2,
            }
        );
    }

    #[actix_rt::test]
    async fn full_quiz_with_wrong_count_fails_without_storing() {
        let mut model = MockModelClient::new();
        model
            .expect_complete()
            .returning(|_| Ok(quiz_json(1)));
        let service = service(model);

        let err = service
            .generate_full_quiz(Some(CONTEXT), None, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidModelOutput(_)));
        assert_eq!(service.count().await, 0);
    }

    #[actix_rt::test]
    async fn unknown_status_is_not_found() {
        let service = service(MockModelClient::new());
        let err = service.session_status("nope").await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
