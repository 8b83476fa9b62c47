pub mod analysis;
pub mod context_source;
pub mod quiz_question;
pub mod quiz_session;

pub use analysis::{AnalysisResult, IncorrectAnswer};
pub use context_source::{ContextSource, DocumentKind};
pub use quiz_question::{QuizQuestion, QuizQuestionError};
pub use quiz_session::{QuizSession, SessionState, SourceContext};
