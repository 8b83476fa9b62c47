use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mini_moka::sync::{Cache, ConcurrentCacheExt};

use crate::{errors::AppResult, services::vector_index::VectorIndex};

#[async_trait]
pub trait ContextRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Arc<VectorIndex>>>;
    async fn insert(&self, id: String, index: VectorIndex) -> AppResult<()>;
    async fn count(&self) -> u64;
}

/// Process-local context storage. Entries expire after sitting unused for the
/// configured idle time, and the least valuable entries are evicted once the
/// capacity is reached.
pub struct InMemoryContextRepository {
    cache: Cache<String, Arc<VectorIndex>>,
}

impl InMemoryContextRepository {
    pub fn new(max_contexts: u64, idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_contexts)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl ContextRepository for InMemoryContextRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Arc<VectorIndex>>> {
        Ok(self.cache.get(&id.to_string()))
    }

    async fn insert(&self, id: String, index: VectorIndex) -> AppResult<()> {
        self.cache.insert(id, Arc::new(index));
        Ok(())
    }

    async fn count(&self) -> u64 {
        self.cache.sync();
        self.cache.entry_count()
    }
}
