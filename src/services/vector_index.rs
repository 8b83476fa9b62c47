use crate::services::embedding_service::cosine_similarity;

#[derive(Clone, Debug)]
struct IndexedChunk {
    text: String,
    vector: Vec<f32>,
}

/// Flat in-memory similarity index over one context's chunks. Built once at
/// ingestion and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedChunk { text, vector })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` chunk texts by descending similarity. Equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<&str> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].text.as_str())
            .collect()
    }
}
