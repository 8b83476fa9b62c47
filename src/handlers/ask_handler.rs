use actix_web::{post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{
        request::{AskRequest, SummarizeRequest},
        response::{AskResponse, SummaryResponse},
    },
    services::prompt_builder::LearnerLevel,
};

#[post("/ask")]
pub async fn ask(
    state: web::Data<AppState>,
    req: HttpRequest,
    request: web::Json<AskRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let level = LearnerLevel::parse(request.user_level.as_deref());
    log::info!(
        "[{}] Answering {} question (context: {})",
        get_request_id(&req).unwrap_or_default(),
        level,
        request.context_id().unwrap_or("none")
    );

    let answer = state
        .answer_service
        .ask(&request.query, level, request.context_id())
        .await?;
    Ok(HttpResponse::Ok().json(AskResponse { answer }))
}

#[post("/summarize")]
pub async fn summarize(
    state: web::Data<AppState>,
    request: web::Json<SummarizeRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let level = LearnerLevel::parse(request.user_level.as_deref());

    let summary = state
        .answer_service
        .summarize(request.context(), request.context_id(), level)
        .await?;
    Ok(HttpResponse::Ok().json(SummaryResponse { summary }))
}
