//! Retriever - query text -> top-k chunks from the vector index

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::embedding::{EmbeddingProvider, TaskType};

use super::vector::{RetrievedChunk, VectorIndex};

/// Number of chunks pulled into each prompt
pub const DEFAULT_TOP_K: usize = 4;

/// Anything that can supply prompt context for a user message
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>>;
}

pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            embedder,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl ContextSource for Retriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        let embedding = self
            .embedder
            .embed(query, TaskType::RetrievalQuery)
            .await
            .context("Failed to embed query")?;

        let chunks = self
            .index
            .search(&embedding, self.top_k)
            .await
            .context("Vector search failed")?;

        tracing::debug!("Retrieved {} chunks for query", chunks.len());
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::vector::IndexEntry;
    use tokio::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str, task: TaskType) -> Result<Vec<f32>> {
            assert_eq!(task, TaskType::RetrievalQuery);
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Records the requested limit and returns that many chunks
    #[derive(Default)]
    struct RecordingIndex {
        last_limit: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn insert_batch(&self, entries: &[IndexEntry]) -> Result<usize> {
            Ok(entries.len())
        }

        async fn search(&self, _q: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>> {
            *self.last_limit.lock().await = Some(limit);
            Ok((0..limit)
                .map(|i| RetrievedChunk {
                    source: "schemes.pdf".to_string(),
                    page: i as i32 + 1,
                    chunk_text: format!("chunk {}", i),
                    score: 1.0,
                })
                .collect())
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }

        async fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retrieve_uses_top_k() {
        let index = Arc::new(RecordingIndex::default());
        let retriever = Retriever::new(index.clone(), Arc::new(FixedEmbedder));

        let chunks = retriever.retrieve("crop insurance").await.unwrap();
        assert_eq!(chunks.len(), DEFAULT_TOP_K);
        assert_eq!(*index.last_limit.lock().await, Some(DEFAULT_TOP_K));
    }

    #[tokio::test]
    async fn test_with_top_k_minimum_one() {
        let retriever =
            Retriever::new(Arc::new(RecordingIndex::default()), Arc::new(FixedEmbedder)).with_top_k(0);
        assert_eq!(retriever.top_k(), 1);
    }
}
