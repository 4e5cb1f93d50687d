//! Knowledge module - the RAG index
//!
//! - builder: PDF / text files -> chunks -> embeddings -> index
//! - lance: LanceDB storage and ANN search
//! - retriever: user query -> top-k context chunks
//! - chunker: recursive character splitting

mod builder;
mod chunker;
mod lance;
mod pdf;
mod retriever;
mod vector;

pub use builder::{collect_sources, BuildStats, IndexBuilder, SourceKind};
pub use chunker::{default_chunker, ChunkConfig, Chunker, RecursiveChunker};
pub use lance::{LanceIndex, DEFAULT_TABLE};
pub use retriever::{ContextSource, Retriever, DEFAULT_TOP_K};
pub use vector::{
    distance_to_score, join_context, IndexEntry, RetrievedChunk, VectorIndex, EMBEDDING_DIMENSION,
};
