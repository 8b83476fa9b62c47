pub mod context_repository;
pub mod session_repository;

pub use context_repository::{ContextRepository, InMemoryContextRepository};
pub use session_repository::{InMemorySessionRepository, SessionRepository};
