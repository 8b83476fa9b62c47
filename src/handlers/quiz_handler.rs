use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::quiz_session::DEFAULT_QUESTION_COUNT,
        dto::{
            request::{AnalyzeQuizRequest, GenerateQuizRequest, QuizMode},
            response::{AnalysisResponse, FullQuizResponse, QuizStepResponse, SessionStatusResponse},
        },
    },
};

#[post("/generate-quiz")]
pub async fn generate_quiz(
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;
    let count = request.num_questions.unwrap_or(DEFAULT_QUESTION_COUNT);

    match request.resolved_mode() {
        QuizMode::Full => {
            let quiz = state
                .quiz_session_service
                .generate_full_quiz(request.context(), request.context_id(), count)
                .await?;
            Ok(HttpResponse::Ok().json(FullQuizResponse {
                quiz: quiz.questions,
                session_id: quiz.session_id,
            }))
        }
        QuizMode::Incremental => {
            let step = state
                .quiz_session_service
                .next_question(
                    request.session_id(),
                    request.context(),
                    request.context_id(),
                    count,
                )
                .await?;
            Ok(HttpResponse::Ok().json(QuizStepResponse::from(step)))
        }
    }
}

#[get("/quiz-sessions/{session_id}")]
pub async fn get_quiz_session(
    state: web::Data<AppState>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .quiz_session_service
        .session_status(&session_id)
        .await?;
    Ok(HttpResponse::Ok().json(SessionStatusResponse::from(&session)))
}

#[post("/analyze-quiz")]
pub async fn analyze_quiz(
    state: web::Data<AppState>,
    request: web::Json<AnalyzeQuizRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let analysis = state
        .quiz_analysis_service
        .analyze(
            &request.quiz_questions,
            &request.answers_by_index(),
            request.context(),
            request.context_id(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(AnalysisResponse { analysis }))
}
