use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mini_moka::sync::{Cache, ConcurrentCacheExt};
use tokio::sync::Mutex;

use crate::{errors::AppResult, models::domain::QuizSession};

/// A session behind its own async lock. Holding the guard is what makes a
/// request the single in-flight mutation for that session.
pub type SharedSession = Arc<Mutex<QuizSession>>;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SharedSession>>;
    async fn insert(&self, session: QuizSession) -> AppResult<SharedSession>;
    async fn count(&self) -> u64;
}

pub struct InMemorySessionRepository {
    cache: Cache<String, SharedSession>,
}

impl InMemorySessionRepository {
    pub fn new(max_sessions: u64, idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SharedSession>> {
        Ok(self.cache.get(&id.to_string()))
    }

    async fn insert(&self, session: QuizSession) -> AppResult<SharedSession> {
        let id = session.id().to_string();
        let shared = Arc::new(Mutex::new(session));
        self.cache.insert(id, shared.clone());
        Ok(shared)
    }

    async fn count(&self) -> u64 {
        self.cache.sync();
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::SourceContext;

    #[actix_rt::test]
    async fn returns_the_same_shared_session() {
        let repo = InMemorySessionRepository::new(10, Duration::from_secs(60));
        let session = QuizSession::new(SourceContext::Raw("text".to_string()), 3);
        let id = session.id().to_string();

        let inserted = repo.insert(session).await.unwrap();
        let found = repo.find_by_id(&id).await.unwrap().expect("stored");

        assert!(Arc::ptr_eq(&inserted, &found));
        assert_eq!(found.lock().await.target_count(), 3);
        assert!(repo.find_by_id("unknown").await.unwrap().is_none());
    }
}
