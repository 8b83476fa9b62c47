pub mod answer_service;
pub mod chunker;
pub mod context_service;
pub mod document_loader;
pub mod embedding_service;
pub mod model_service;
pub mod prompt_builder;
pub mod quiz_analysis_service;
pub mod quiz_session_service;
pub mod response_parser;
pub mod transcript_service;
pub mod vector_index;
