//! krishi-sahayak - bilingual agricultural assistant
//!
//! Crop disease detection through a served image classifier, RAG chatbots
//! over a LanceDB index of scheme documents, and an agriculture news feed
//! scraped into CSV. English and Marathi throughout.

pub mod app;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod disease;
pub mod embedding;
pub mod i18n;
pub mod knowledge;
pub mod llm;
pub mod news;

// Re-exports
pub use app::{Section, Session};
pub use assistant::{AssistantKind, AssistantSession, Conversation, Turn};
pub use config::AppConfig;
pub use disease::{DetectError, DiseaseDetector, Prediction, Remedy};
pub use embedding::{EmbeddingProvider, GeminiEmbedding, TaskType};
pub use i18n::{Language, Strings};
pub use knowledge::{ContextSource, IndexBuilder, LanceIndex, Retriever, VectorIndex};
pub use llm::{ChatModel, GroqChat};
pub use news::{NewsArticle, NewsScraper, ScrapeReport, SeedFilter};
