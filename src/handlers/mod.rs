pub mod ask_handler;
pub mod context_handler;
pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::errors::AppError;

pub use ask_handler::{ask, summarize};
pub use context_handler::process_context;
pub use health_handler::{health_check, health_check_live, health_check_ready, home};
pub use quiz_handler::{analyze_quiz, generate_quiz, get_quiz_session};

/// Registers every route plus the JSON extractor config that turns body
/// parse failures into structured validation errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| AppError::from(err).into()),
    )
    .service(home)
    .service(health_check)
    .service(health_check_live)
    .service(health_check_ready)
    .service(process_context)
    .service(ask)
    .service(summarize)
    .service(generate_quiz)
    .service(get_quiz_session)
    .service(analyze_quiz);
}
