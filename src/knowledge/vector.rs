//! Vector index - trait and shared types
//!
//! The concrete store is LanceDB (see `lance.rs`).

use anyhow::Result;
use async_trait::async_trait;

/// Embedding dimension (Gemini gemini-embedding-001 default)
pub const EMBEDDING_DIMENSION: i32 = 768;

// ============================================================================
// Types
// ============================================================================

/// One embedded chunk to store
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Source file name
    pub source: String,
    /// 1-based page number within the source
    pub page: i32,
    /// 0-based chunk position within the page
    pub chunk_index: i32,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub source: String,
    pub page: i32,
    pub chunk_text: String,
    /// Similarity score (higher is closer)
    pub score: f32,
}

// ============================================================================
// VectorIndex Trait
// ============================================================================

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn insert_batch(&self, entries: &[IndexEntry]) -> Result<usize>;

    /// Top-`limit` nearest chunks
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<RetrievedChunk>>;

    async fn count(&self) -> Result<usize>;

    /// Drop every stored chunk
    async fn clear(&self) -> Result<()>;
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Convert an L2 distance into a (0, 1] similarity score
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Join retrieved chunk texts into a prompt context block
pub fn join_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            source: "schemes.pdf".to_string(),
            page: 1,
            chunk_text: text.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_distance_to_score() {
        assert_eq!(distance_to_score(0.0), 1.0);
        assert!(distance_to_score(1.0) < distance_to_score(0.5));
        assert_eq!(distance_to_score(-3.0), 1.0);
    }

    #[test]
    fn test_join_context() {
        let joined = join_context(&[chunk("PM-KISAN"), chunk("PMFBY")]);
        assert_eq!(joined, "PM-KISAN\n\nPMFBY");
        assert_eq!(join_context(&[]), "");
    }
}
