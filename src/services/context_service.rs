use std::sync::Arc;

use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{ContextSource, DocumentKind},
    repositories::ContextRepository,
    services::{
        chunker::TextChunker,
        document_loader::{self, DocumentError},
        embedding_service::{EmbeddingError, EmbeddingProvider},
        transcript_service::TranscriptFetcher,
        vector_index::VectorIndex,
    },
};

/// Query used when a caller needs broad coverage of a context rather than an
/// answer to a specific question.
pub const BROAD_COVERAGE_QUERY: &str = "main ideas and key concepts";

pub const ASK_TOP_K: usize = 3;
pub const SUMMARY_TOP_K: usize = 8;
pub const QUIZ_TOP_K: usize = 8;
pub const ANALYSIS_TOP_K: usize = 6;

const CHUNK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedContext {
    pub context_id: String,
    pub chunk_count: usize,
}

pub struct ContextService {
    repository: Arc<dyn ContextRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    transcripts: Arc<dyn TranscriptFetcher>,
    chunker: TextChunker,
}

impl ContextService {
    pub fn new(
        repository: Arc<dyn ContextRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        transcripts: Arc<dyn TranscriptFetcher>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            repository,
            embedder,
            transcripts,
            chunker,
        }
    }

    /// Turns a document or transcript into a stored, searchable context. Nothing
    /// is stored unless every step succeeds.
    pub async fn ingest(&self, source: ContextSource) -> AppResult<IngestedContext> {
        let label = source.describe();
        let text = self.load_text(source).await?;

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(AppError::IngestionError(
                "No text could be extracted from the input".to_string(),
            ));
        }

        let vectors = self.embedder.embed(chunks.clone()).await?;
        if vectors.len() != chunks.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let chunk_count = chunks.len();
        let context_id = Uuid::new_v4().to_string();
        self.repository
            .insert(context_id.clone(), VectorIndex::new(chunks, vectors))
            .await?;

        log::info!(
            "Stored context {} from {} ({} chunks)",
            context_id,
            label,
            chunk_count
        );
        Ok(IngestedContext {
            context_id,
            chunk_count,
        })
    }

    async fn load_text(&self, source: ContextSource) -> AppResult<String> {
        match source {
            ContextSource::Document {
                filename,
                content_type,
                bytes,
            } => {
                let kind = DocumentKind::detect(content_type.as_deref(), filename.as_deref())
                    .ok_or(DocumentError::UnsupportedType)?;

                let text = tokio::task::spawn_blocking(move || {
                    document_loader::extract_text(kind, &bytes)
                })
                .await
                .map_err(|e| AppError::IngestionError(format!("Document extraction failed: {}", e)))??;
                Ok(text)
            }
            ContextSource::Transcript { url } => Ok(self.transcripts.fetch(&url).await?),
        }
    }

    /// Top `k` chunks for `query`, most similar first, joined by a blank line.
    pub async fn retrieve(&self, context_id: &str, query: &str, k: usize) -> AppResult<String> {
        let index = self
            .repository
            .find_by_id(context_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Context not found: {}", context_id)))?;

        let query_vector = self
            .embedder
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                actual: 0,
            })?;

        let hits = index.search(&query_vector, k);
        log::debug!(
            "Retrieved {} of {} chunks from context {}",
            hits.len(),
            index.len(),
            context_id
        );
        Ok(hits.join(CHUNK_SEPARATOR))
    }

    pub async fn contains(&self, context_id: &str) -> AppResult<bool> {
        Ok(self.repository.find_by_id(context_id).await?.is_some())
    }

    pub async fn count(&self) -> u64 {
        self.repository.count().await
    }
}
